pub(super) mod facade;
pub mod headers;
mod impls;
pub(super) mod middleware;
