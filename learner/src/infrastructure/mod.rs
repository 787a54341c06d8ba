// Copyright (c) 2026 Quorum Labs
// SPDX-License-Identifier: AGPL-3.0

//! Infrastructure layer for the Experience Store

pub mod memory;
pub mod repository;

pub use memory::InMemoryRecordRepository;
pub use repository::RecordRepository;
