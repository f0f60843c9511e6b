pub mod entity;
pub mod expand;
pub mod facet;
pub mod geo;
