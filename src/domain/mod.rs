pub mod collision;
pub mod entity;
pub mod geom;
pub mod patrol;
pub mod physics;
pub mod tile;
