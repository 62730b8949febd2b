//! Shop resources.

pub mod mechanic;
pub mod product;
pub mod profile;

pub use mechanic::{Mechanic, MechanicPatch, Mechanics, NewMechanic};
pub use product::{NewProduct, Product, ProductPatch, Products};
pub use profile::{NewProfile, Profile, ProfilePatch, Profiles, Role};

use crate::config::TableSpec;
use crate::resource::Resource;

/// Table specs for every shop resource, in creation order.
pub fn shop_tables(schema: &str) -> Vec<TableSpec> {
    vec![
        Profiles::table_spec(schema),
        Mechanics::table_spec(schema),
        Products::table_spec(schema),
    ]
}
