pub mod hash;
pub mod media;
pub mod track;
