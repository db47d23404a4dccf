// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Built-in workspace tools.

mod list_dir;
mod read_file;
mod write_file;

pub use list_dir::ListDirHandler;
pub use read_file::ReadFileHandler;
pub use write_file::WriteFileHandler;
