// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the pick and place cycle loop and the state it carries from cycle to cycle.

pub mod context;
pub mod phase;
pub mod sequencer;
pub mod stop_token;
