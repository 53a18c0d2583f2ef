mod test_helper;

pub use test_helper::*;
