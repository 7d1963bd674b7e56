pub mod entities;
pub mod review;
pub mod value_objects;
