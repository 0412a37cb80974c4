pub mod entities;
pub mod items;
pub mod sync;
pub mod transfer;
