pub mod cart_viewmodel;

pub use cart_viewmodel::{CartFailure, CartItem, CartReport, CartViewModel};
