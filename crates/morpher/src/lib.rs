#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use morpher_image as image;

#[doc(inline)]
pub use morpher_imgproc as imgproc;

#[doc(inline)]
pub use morpher_morph as morph;
