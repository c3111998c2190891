// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Built-in waypoint tables in \[counts\].

/// Fast pick, move, drop and return path of the three axes.
///
/// Starts and ends at the origin so that consecutive batches join without a jump.
pub const FAST_PICK_AND_PLACE: [[f64; 3]; 14] = [
    [0., 0., 0.],
    [2000., 2000., 2000.],
    [12000., 12000., 12000.],
    [22000., 22000., 22000.],
    [29050., 29050., 29050.],
    [30200., 30200., 30850.],
    [30170., 30500., 30800.],
    [30150., 30150., 30550.],
    [29050., 29050., 29050.],
    [22000., 22000., 22000.],
    [12000., 12000., 12000.],
    [3000., 3000., 3000.],
    [1000., 1000., 1000.],
    [0., 0., 0.],
];
