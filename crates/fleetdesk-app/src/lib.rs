// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod column;
pub mod format;
pub mod ids;
pub mod menu;
pub mod model;
pub mod pipeline;
pub mod selection;
pub mod state;
pub mod table;
pub mod viewport;

pub use column::*;
pub use format::*;
pub use ids::*;
pub use menu::*;
pub use model::*;
pub use pipeline::*;
pub use selection::*;
pub use state::*;
pub use table::*;
pub use viewport::*;
