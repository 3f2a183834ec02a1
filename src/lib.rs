/*
 * This file is part of Luxd.
 *
 * Copyright (C) 2025 Luxd contributors
 *
 * Luxd is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Luxd is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Luxd. If not, see <https://www.gnu.org/licenses/>.
 */

//! Luxd - ambient light driven display brightness for Linux
//!
//! This library provides the core functionality for reading ambient light
//! sensors, recommending brightness values through a linear mapping with
//! hysteresis, and driving display brightness backends.

pub mod config;
pub mod controller;
pub mod sources;
pub mod targets;
pub mod condition;
pub mod service;
pub mod system;
pub mod logger;

#[cfg(test)]
pub mod test_utils;
