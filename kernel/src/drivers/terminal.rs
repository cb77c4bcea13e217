//! Terminals and their line discipline
//!
//! Three fixed terminals. Keystrokes always go to the *displayed* terminal;
//! the CPU belongs to the process of the *scheduled* terminal. The two are
//! independent.

use super::vga::Cursor;
use crate::config::{ARG_BUF_LEN, NUM_TERMINALS};
use crate::task::Pid;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TerminalId(u8);

impl TerminalId {
    pub const FIRST: TerminalId = TerminalId(0);

    pub const fn new(index: usize) -> Option<Self> {
        if index < NUM_TERMINALS {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Round-robin successor.
    pub const fn next(self) -> Self {
        Self(((self.0 as usize + 1) % NUM_TERMINALS) as u8)
    }
}

pub struct Terminal {
    line: [u8; ARG_BUF_LEN],
    len: usize,
    /// Enter was pressed and the line has not been read yet
    line_ready: bool,
    /// Foreground process; `None` until the terminal's shell is launched
    foreground: Option<Pid>,
    /// Cursor saved while the terminal is not scheduled
    cursor: Cursor,
}

impl Terminal {
    pub const fn new() -> Self {
        Self {
            line: [0; ARG_BUF_LEN],
            len: 0,
            line_ready: false,
            foreground: None,
            cursor: Cursor::origin(),
        }
    }

    pub fn foreground(&self) -> Option<Pid> {
        self.foreground
    }

    pub fn set_foreground(&mut self, pid: Option<Pid>) {
        self.foreground = pid;
    }

    pub fn is_active(&self) -> bool {
        self.foreground.is_some()
    }

    /// Append a typed byte. One slot stays free for the trailing newline.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.line_ready || self.len >= ARG_BUF_LEN - 1 {
            return false;
        }
        self.line[self.len] = byte;
        self.len += 1;
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.line_ready || self.len == 0 {
            return false;
        }
        self.len -= 1;
        true
    }

    pub fn complete_line(&mut self) {
        self.line_ready = true;
    }

    pub fn line_ready(&self) -> bool {
        self.line_ready
    }

    pub fn pending(&self) -> &[u8] {
        &self.line[..self.len]
    }

    /// Hand out a finished line plus `\n`, at most `buf.len()` bytes.
    ///
    /// Returns `None` while no line is complete.
    pub fn take_line(&mut self, buf: &mut [u8]) -> Option<usize> {
        if !self.line_ready {
            return None;
        }
        self.line[self.len] = b'\n';
        let count = (self.len + 1).min(buf.len());
        buf[..count].copy_from_slice(&self.line[..count]);
        self.discard_line();
        Some(count)
    }

    pub fn discard_line(&mut self) {
        self.len = 0;
        self.line_ready = false;
    }
}

pub struct Terminals {
    slots: [Terminal; NUM_TERMINALS],
    displayed: TerminalId,
    scheduled: TerminalId,
    /// Cursor of the scheduled terminal while it runs
    live_cursor: Cursor,
}

impl Terminals {
    pub const fn new() -> Self {
        Self {
            slots: [Terminal::new(), Terminal::new(), Terminal::new()],
            displayed: TerminalId::FIRST,
            scheduled: TerminalId::FIRST,
            live_cursor: Cursor::origin(),
        }
    }

    pub fn get(&self, id: TerminalId) -> &Terminal {
        &self.slots[id.index()]
    }

    pub fn get_mut(&mut self, id: TerminalId) -> &mut Terminal {
        &mut self.slots[id.index()]
    }

    pub fn displayed(&self) -> TerminalId {
        self.displayed
    }

    pub fn set_displayed(&mut self, id: TerminalId) {
        self.displayed = id;
    }

    pub fn scheduled(&self) -> TerminalId {
        self.scheduled
    }

    /// Make `id` the scheduled terminal, parking the old cursor and loading
    /// the new one.
    pub fn schedule(&mut self, id: TerminalId) {
        self.slots[self.scheduled.index()].cursor = self.live_cursor;
        self.scheduled = id;
        self.live_cursor = self.slots[id.index()].cursor;
    }

    /// The cursor `id` draws with.
    pub fn cursor_mut(&mut self, id: TerminalId) -> &mut Cursor {
        if id == self.scheduled {
            &mut self.live_cursor
        } else {
            &mut self.slots[id.index()].cursor
        }
    }

    pub fn cursor(&self, id: TerminalId) -> Cursor {
        if id == self.scheduled {
            self.live_cursor
        } else {
            self.slots[id.index()].cursor
        }
    }

    /// First active terminal after `from` in round-robin order, `from`
    /// itself coming last.
    pub fn next_active(&self, from: TerminalId) -> Option<TerminalId> {
        let mut candidate = from;
        for _ in 0..NUM_TERMINALS {
            candidate = candidate.next();
            if self.get(candidate).is_active() {
                return Some(candidate);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_is_capped_and_newline_terminated() {
        let mut terminal = Terminal::new();
        for _ in 0..200 {
            terminal.push(b'a');
        }
        assert_eq!(terminal.pending().len(), ARG_BUF_LEN - 1);
        assert!(terminal.backspace());
        assert_eq!(terminal.take_line(&mut [0; 8]), None);

        terminal.complete_line();
        assert!(!terminal.push(b'b'));
        let mut buf = [0u8; ARG_BUF_LEN];
        assert_eq!(terminal.take_line(&mut buf), Some(ARG_BUF_LEN - 1));
        assert_eq!(buf[ARG_BUF_LEN - 2], b'\n');
        assert!(!terminal.line_ready());
        assert!(terminal.pending().is_empty());
    }

    #[test]
    fn short_buffer_truncates_line() {
        let mut terminal = Terminal::new();
        for &b in b"ls -l" {
            terminal.push(b);
        }
        terminal.complete_line();
        let mut buf = [0u8; 2];
        assert_eq!(terminal.take_line(&mut buf), Some(2));
        assert_eq!(&buf, b"ls");
    }

    #[test]
    fn next_active_skips_idle_terminals() {
        let mut terminals = Terminals::new();
        let t0 = TerminalId::new(0).unwrap();
        let t2 = TerminalId::new(2).unwrap();
        assert_eq!(terminals.next_active(t0), None);

        terminals.get_mut(t0).set_foreground(Pid::new(0));
        assert_eq!(terminals.next_active(t0), Some(t0));

        terminals.get_mut(t2).set_foreground(Pid::new(2));
        assert_eq!(terminals.next_active(t0), Some(t2));
        assert_eq!(terminals.next_active(t2), Some(t0));
    }

    #[test]
    fn schedule_swaps_cursors() {
        let mut terminals = Terminals::new();
        let t1 = TerminalId::new(1).unwrap();
        *terminals.cursor_mut(TerminalId::FIRST) = Cursor { x: 4, y: 2 };
        terminals.schedule(t1);
        assert_eq!(terminals.cursor(t1), Cursor::origin());
        assert_eq!(terminals.cursor(TerminalId::FIRST), Cursor { x: 4, y: 2 });
        terminals.schedule(TerminalId::FIRST);
        assert_eq!(terminals.cursor(TerminalId::FIRST), Cursor { x: 4, y: 2 });
    }
}
