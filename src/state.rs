// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{directory::UserDirectory, pipeline::ImagePipeline};

#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<RwLock<UserDirectory>>,
    pub pipeline: Arc<ImagePipeline>,
}

impl AppState {
    pub fn new(directory: UserDirectory, pipeline: ImagePipeline) -> Self {
        Self {
            directory: Arc::new(RwLock::new(directory)),
            pipeline: Arc::new(pipeline),
        }
    }
}
