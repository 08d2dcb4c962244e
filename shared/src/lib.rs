//! Types shared between the calendar side and the lighting side of the
//! daemon: normalized calendar windows, lighting modes and the Hue bridge
//! wire format.

pub mod api;
pub mod models;
