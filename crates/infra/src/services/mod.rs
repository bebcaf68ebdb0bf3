mod voice;

pub use voice::*;
