// SPDX-License-Identifier: GPL-3.0-only
//! LG display device specifications

pub mod ultragear;
