pub mod preprocessing;
pub mod threshold;
pub mod holes;
pub mod binarize;
pub mod distance;
pub mod seeds;
pub mod watershed;
pub mod regions;
pub mod annotate;

pub use preprocessing::*;
pub use threshold::*;
pub use holes::*;
pub use binarize::*;
pub use distance::*;
pub use seeds::*;
pub use watershed::*;
pub use regions::*;
pub use annotate::*;
