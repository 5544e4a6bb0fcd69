//! Helper functions shared by the renderers

pub mod html;
pub mod natsort;
