// Core modules for request shapes, page decoding, and error modeling. No I/O.
pub mod api_error;
pub mod error;
pub mod exclusive;
pub mod page;
pub mod params;
