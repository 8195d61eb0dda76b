// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tree-shaped printers for reporting what alertsim is about to do, and what
//! went wrong along the way.
//!
//! ```text
//! Simulation summary
//! ├ Pointings: 10
//! │ Processed: 10
//! └ Alerts: 30 in 10 batches
//! ```

use std::{borrow::Cow, sync::Mutex};

use log::Level;

const VERTICAL: char = '│';
const UP_AND_RIGHT: char = '└';
const VERTICAL_AND_RIGHT: char = '├';

type Block = Vec<Cow<'static, str>>;

lazy_static::lazy_static! {
    static ref WARNINGS: Mutex<Vec<Block>> = Mutex::new(vec![]);
}

/// Log `title` in bold, then every line of every block with a tree symbol in
/// front of it.
fn draw(level: Level, title: &str, blocks: &[Block]) {
    log::log!(level, "{}", console::style(title).bold());
    let num_blocks = blocks.len();
    for (i_block, block) in blocks.iter().enumerate() {
        let last_block = i_block + 1 == num_blocks;
        for (i_line, line) in block.iter().enumerate() {
            let symbol = match (i_line, last_block) {
                (0, false) => VERTICAL_AND_RIGHT,
                (0, true) if block.len() > 1 => VERTICAL_AND_RIGHT,
                (0, true) => UP_AND_RIGHT,
                _ => VERTICAL,
            };
            log::log!(level, "{symbol} {line}");
        }
    }
    log::log!(level, "");
}

/// Collects blocks of information, which are logged together at the info
/// level.
pub(crate) struct InfoPrinter {
    title: Cow<'static, str>,
    blocks: Vec<Block>,
}

impl InfoPrinter {
    pub(crate) fn new(title: Cow<'static, str>) -> Self {
        Self {
            title,
            blocks: vec![],
        }
    }

    pub(crate) fn push_line(&mut self, line: Cow<'static, str>) {
        self.blocks.push(vec![line]);
    }

    pub(crate) fn push_block(&mut self, block: Block) {
        if !block.is_empty() {
            self.blocks.push(block);
        }
    }

    pub(crate) fn display(self) {
        draw(Level::Info, &self.title, &self.blocks);
    }
}

/// Something that can be queued as a warning. Warnings are held until
/// [`display_warnings`] is called.
pub(crate) trait Warn {
    fn warn(self);
}

fn queue_warning(block: Block) {
    match WARNINGS.lock() {
        Ok(mut w) => w.push(block),
        // Poisoned; log it straight away.
        Err(_) => block.iter().for_each(|l| log::warn!("{l}")),
    }
}

impl Warn for &'static str {
    fn warn(self) {
        queue_warning(vec![self.into()]);
    }
}

impl Warn for String {
    fn warn(self) {
        queue_warning(vec![self.into()]);
    }
}

impl Warn for Cow<'static, str> {
    fn warn(self) {
        queue_warning(vec![self]);
    }
}

impl Warn for Vec<Cow<'static, str>> {
    fn warn(self) {
        queue_warning(self);
    }
}

/// Print out any warnings that have been collected as CLI arguments have been
/// parsed. This should be called once, after arguments have been parsed into
/// parameters.
pub(crate) fn display_warnings() {
    log::debug!("Displaying warnings");
    let blocks = match WARNINGS.lock() {
        Ok(mut w) => std::mem::take(&mut *w),
        Err(_) => return,
    };
    if !blocks.is_empty() {
        draw(Level::Warn, "Warnings", &blocks);
    }
}
