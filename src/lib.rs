// SQL 练习应用核心库
// 桌面外壳通过 `desktop` 特性启用

pub mod models;
pub mod services;
pub mod utils;

#[cfg(feature = "desktop")]
pub mod commands;
