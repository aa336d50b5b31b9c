//! Session driver: the render, read, dispatch loop.
//!
//! The loop is single-threaded and synchronous; nothing blocks except the
//! key read. Terminal restoration is the caller's job (via `TtyGuard` or a
//! signal watcher) so it runs exactly once on every exit path, including
//! the ones this module never sees.

use std::io;

use crate::config::Options;
use crate::core::filter::{filter_lines, Line};
use crate::core::keys::{next_key, Key};
use crate::core::tty::{Tty, HIDE_CURSOR};
use crate::render::frame::{paint, Frame};

/// How the session ended. Cancellation is a normal terminal state, not an
/// error; it just carries no results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Selected(Vec<String>),
    Cancelled,
}

/// Runs the interactive loop until the user confirms or cancels.
pub fn run(tty: &mut dyn Tty, opts: &Options, lines: &[Line]) -> io::Result<Outcome> {
    tty.enter_raw_mode()?;
    tty.write(HIDE_CURSOR);

    let mut query = String::new();
    let mut cursor = opts.header_rows;
    let mut offset = 0usize;
    let mut dirty = vec![true; lines.len()];
    let mut selected = vec![false; lines.len()];
    let mut last_visible = 0usize;

    loop {
        let view = filter_lines(
            lines,
            &query,
            opts.match_segment,
            opts.case_insensitive,
            opts.header_rows,
        );
        let first_row = if view.is_empty() {
            0
        } else {
            opts.header_rows.min(view.len() - 1)
        };
        if view.is_empty() {
            cursor = 0;
        } else {
            cursor = cursor.clamp(first_row, view.len() - 1);
        }
        if offset > cursor {
            offset = cursor;
            mark_all(&mut dirty);
        }

        let (columns, rows) = tty.size();
        let (width, height) = (columns as usize, rows as usize);
        let list_height = height
            .saturating_sub(usize::from(opts.query_mode))
            .max(1);
        if cursor >= offset + list_height {
            offset = cursor + 1 - list_height;
            mark_all(&mut dirty);
        }

        let display: Vec<String> = view
            .iter()
            .map(|&idx| lines[idx].display().replace('\t', "    "))
            .collect();
        let view_selected: Vec<bool> = view.iter().map(|&idx| selected[idx]).collect();
        let visible = display.len().saturating_sub(offset).min(list_height);

        let frame = Frame {
            lines: &display,
            selected: &view_selected,
            cursor,
            offset,
            query: opts.query_mode.then_some(query.as_str()),
            width,
            height,
            blank_tail: last_visible.saturating_sub(visible),
            scroll_compensation: tty.scrolls_on_last_row(),
        };
        let mut out = String::new();
        paint(&frame, &mut dirty, &opts.highlight, &mut out);
        tty.write(&out);
        tty.flush()?;
        last_visible = visible;

        match next_key(tty, opts.query_mode)? {
            Key::Down => {
                if cursor + 1 < view.len() {
                    dirty[cursor] = true;
                    dirty[cursor + 1] = true;
                    cursor += 1;
                    if cursor - offset >= list_height {
                        offset += 1;
                        mark_all(&mut dirty);
                    }
                }
            }
            Key::Up => {
                if cursor > first_row {
                    dirty[cursor] = true;
                    dirty[cursor - 1] = true;
                    cursor -= 1;
                    if cursor < offset {
                        offset -= 1;
                        mark_all(&mut dirty);
                    }
                }
            }
            Key::ToggleSelect => {
                if opts.multi_select {
                    if let Some(&absolute) = view.get(cursor) {
                        if absolute >= opts.header_rows {
                            selected[absolute] = !selected[absolute];
                            dirty[cursor] = true;
                        }
                    }
                }
            }
            Key::ClearQuery => {
                if opts.query_mode && !query.is_empty() {
                    query.clear();
                    cursor = opts.header_rows;
                    offset = 0;
                    mark_all(&mut dirty);
                }
            }
            Key::Backspace => {
                if opts.query_mode && !query.is_empty() {
                    query.pop();
                    cursor = opts.header_rows;
                    offset = 0;
                    mark_all(&mut dirty);
                }
            }
            Key::Char(ch) => {
                if opts.query_mode {
                    query.push(ch);
                    cursor = opts.header_rows;
                    offset = 0;
                    mark_all(&mut dirty);
                }
            }
            Key::Confirm => {
                return Ok(Outcome::Selected(collect_results(
                    opts, lines, &view, cursor, &selected,
                )));
            }
            Key::Cancel => return Ok(Outcome::Cancelled),
            Key::Other => {}
        }
    }
}

fn mark_all(dirty: &mut [bool]) {
    for flag in dirty.iter_mut() {
        *flag = true;
    }
}

/// Multi-select yields toggled rows in ascending original-index order, no
/// matter the order they were toggled in; with nothing toggled it falls
/// back to the cursor row, like single-select. Header rows never produce
/// output.
fn collect_results(
    opts: &Options,
    lines: &[Line],
    view: &[usize],
    cursor: usize,
    selected: &[bool],
) -> Vec<String> {
    if opts.multi_select {
        let picked: Vec<String> = selected
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(|(idx, _)| lines[idx].output().to_string())
            .collect();
        if !picked.is_empty() {
            return picked;
        }
    }

    match view.get(cursor) {
        Some(&absolute) if absolute >= opts.header_rows => {
            vec![lines[absolute].output().to_string()]
        }
        _ => Vec::new(),
    }
}
