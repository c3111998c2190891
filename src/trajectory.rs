// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains everything needed to build and store PVT trajectories.

pub mod builder;
pub mod csv;
pub mod pvt_point;
pub mod segment_buffer;
pub mod waypoints;
