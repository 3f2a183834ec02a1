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

use std::process::Command;

/// Best-effort load of kernel modules for ambient light sensors and the
/// i2c device interface ddcutil depends on. Missing modules are silently
/// skipped.
pub fn load_sensor_modules() {
    let modules = [
        // ACPI ambient light
        "acpi_als",
        // HID-over-I2C light sensors (laptops, convertibles)
        "hid_sensor_als",
        "hid_sensor_iio_common",
        "hid_sensor_trigger",
        // Discrete I2C ambient light chips
        "apds9300",
        "apds9960",
        "bh1750",
        "cm32181",
        "cm3232",
        "cm3323",
        "isl29018",
        "isl29125",
        "ltr501",
        "max44009",
        "opt3001",
        "rpr0521",
        "stk3310",
        "tsl2563",
        "tsl2583",
        "tsl4531",
        "vcnl4000",
        "veml6030",
        // DDC/CI access for external displays
        "i2c_dev",
    ];

    for module in modules {
        let _ = Command::new("modprobe").arg("-q").arg(module).output();
    }
}
