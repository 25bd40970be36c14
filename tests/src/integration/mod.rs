//! Integration tests over the public session API.

mod flows;
mod lifecycle;
mod properties;
