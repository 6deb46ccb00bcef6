//! Flutter bridge surface for the Salonbook customer store.

pub mod api;
