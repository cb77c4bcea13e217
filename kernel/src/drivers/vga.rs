//! VGA text-mode surfaces
//!
//! A surface is 80x25 cells of `attribute << 8 | ascii`. The physical screen
//! and the three off-screen terminal buffers share the same helpers; the
//! kernel decides which one a terminal currently draws on.

use super::terminal::TerminalId;
use crate::arch::Port;
use crate::config::{NUM_TERMINALS, SCREEN_COLS, SCREEN_ROWS, TEXT_ATTRIBUTE};

pub const CELLS: usize = SCREEN_COLS * SCREEN_ROWS;

const CRTC_INDEX: Port = Port::new(0x3D4);
const CRTC_DATA: Port = Port::new(0x3D5);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub x: usize,
    pub y: usize,
}

impl Cursor {
    pub const fn origin() -> Self {
        Self { x: 0, y: 0 }
    }

    fn offset(&self) -> usize {
        self.y * SCREEN_COLS + self.x
    }
}

#[inline]
pub const fn cell(byte: u8) -> u16 {
    (TEXT_ATTRIBUTE as u16) << 8 | byte as u16
}

pub fn put_byte(cells: &mut [u16], cursor: &mut Cursor, byte: u8) {
    match byte {
        b'\n' => newline(cells, cursor),
        b'\r' => cursor.x = 0,
        0 => {}
        _ => {
            cells[cursor.offset()] = cell(byte);
            cursor.x += 1;
            if cursor.x == SCREEN_COLS {
                newline(cells, cursor);
            }
        }
    }
}

pub fn write_bytes(cells: &mut [u16], cursor: &mut Cursor, bytes: &[u8]) {
    for &byte in bytes {
        put_byte(cells, cursor, byte);
    }
}

fn newline(cells: &mut [u16], cursor: &mut Cursor) {
    cursor.x = 0;
    if cursor.y + 1 == SCREEN_ROWS {
        scroll(cells);
    } else {
        cursor.y += 1;
    }
}

/// Move every row up by one and blank the last row.
pub fn scroll(cells: &mut [u16]) {
    cells.copy_within(SCREEN_COLS..CELLS, 0);
    cells[CELLS - SCREEN_COLS..CELLS].fill(cell(b' '));
}

/// Step back over the previous cell and blank it.
pub fn erase(cells: &mut [u16], cursor: &mut Cursor) {
    if cursor.x > 0 {
        cursor.x -= 1;
    } else if cursor.y > 0 {
        cursor.y -= 1;
        cursor.x = SCREEN_COLS - 1;
    } else {
        return;
    }
    cells[cursor.offset()] = cell(b' ');
}

pub fn clear(cells: &mut [u16], cursor: &mut Cursor) {
    cells[..CELLS].fill(cell(b' '));
    *cursor = Cursor::origin();
}

/// Move the blinking hardware cursor.
pub fn move_hardware_cursor(cursor: Cursor) {
    let position = cursor.offset() as u16;
    CRTC_INDEX.write(0x0F);
    CRTC_DATA.write(position as u8);
    CRTC_INDEX.write(0x0E);
    CRTC_DATA.write((position >> 8) as u8);
}

/// The physical screen plus one private buffer per terminal
pub struct Video {
    screen: &'static mut [u16],
    buffers: [&'static mut [u16]; NUM_TERMINALS],
}

impl Video {
    pub fn new(screen: &'static mut [u16], buffers: [&'static mut [u16]; NUM_TERMINALS]) -> Self {
        Self { screen, buffers }
    }

    /// Where `terminal` draws: the screen if it is displayed, its buffer otherwise.
    pub fn surface(&mut self, terminal: TerminalId, displayed: TerminalId) -> &mut [u16] {
        if terminal == displayed {
            &mut self.screen[..]
        } else {
            &mut self.buffers[terminal.index()][..]
        }
    }

    /// Park the screen contents in `from`'s buffer and show `to`'s.
    pub fn switch(&mut self, from: TerminalId, to: TerminalId) {
        self.buffers[from.index()][..CELLS].copy_from_slice(&self.screen[..CELLS]);
        self.screen[..CELLS].copy_from_slice(&self.buffers[to.index()][..CELLS]);
    }

    pub fn clear_all(&mut self) {
        self.screen[..CELLS].fill(cell(b' '));
        for buffer in self.buffers.iter_mut() {
            buffer[..CELLS].fill(cell(b' '));
        }
    }

    pub fn screen(&self) -> &[u16] {
        &self.screen[..CELLS]
    }

    pub fn buffer(&self, terminal: TerminalId) -> &[u16] {
        &self.buffers[terminal.index()][..CELLS]
    }
}
