//! File and filesystem-related syscalls

use super::Outcome;
use crate::config::FILENAME_LEN;
use crate::error::{SysError, SysResult};
use crate::fs::{FileKind, FileType, OpenFile};
use crate::state::Kernel;

const STDIN: i32 = 0;
const STDOUT: i32 = 1;

impl Kernel {
    pub(super) fn sys_read(&mut self, fd: i32, buf: u32, nbytes: i32) -> SysResult<Outcome> {
        let file = *self.current_pcb_mut()?.files.get_mut(fd)?;
        if fd == STDOUT {
            return Err(SysError::InvalidArgument);
        }
        let nbytes = usize::try_from(nbytes).map_err(|_| SysError::InvalidArgument)?;

        match file.kind {
            FileKind::Terminal(terminal) => {
                let dest = self.user.slice_mut(buf, nbytes)?;
                Ok(match self.terminals.get_mut(terminal).take_line(dest) {
                    Some(count) => Outcome::Return(count as i32),
                    None => Outcome::Block,
                })
            }
            FileKind::Rtc { wake_at } => {
                let now = self.rtc.ticks();
                let (wake_at, outcome) = match wake_at {
                    Some(tick) if now >= tick => (None, Outcome::Return(0)),
                    Some(tick) => (Some(tick), Outcome::Block),
                    None => (Some(now + 1), Outcome::Block),
                };
                self.current_pcb_mut()?.files.get_mut(fd)?.kind = FileKind::Rtc { wake_at };
                Ok(outcome)
            }
            FileKind::Directory => {
                if file.position >= self.fs.dentry_count() {
                    return Ok(Outcome::Return(0));
                }
                let dentry = self.fs.read_dentry_by_index(file.position)?;
                let dest = self.user.slice_mut(buf, nbytes)?;
                let name = dentry.name();
                let span = nbytes.min(FILENAME_LEN);
                let count = name.len().min(span);
                dest[..count].copy_from_slice(&name[..count]);
                dest[count..span].fill(0);
                self.current_pcb_mut()?.files.get_mut(fd)?.position += 1;
                Ok(Outcome::Return(count as i32))
            }
            FileKind::Regular { inode } => {
                let dest = self.user.slice_mut(buf, nbytes)?;
                let count = self.fs.read_data(inode, file.position, dest)?;
                self.current_pcb_mut()?.files.get_mut(fd)?.position += count as u32;
                Ok(Outcome::Return(count as i32))
            }
        }
    }

    pub(super) fn sys_write(&mut self, fd: i32, buf: u32, nbytes: i32) -> SysResult<i32> {
        let file = *self.current_pcb_mut()?.files.get_mut(fd)?;
        if fd == STDIN {
            return Err(SysError::InvalidArgument);
        }
        let nbytes = usize::try_from(nbytes).map_err(|_| SysError::InvalidArgument)?;

        match file.kind {
            FileKind::Terminal(terminal) => {
                let displayed = self.terminals.displayed();
                let source = self.user.slice(buf, nbytes)?;
                let surface = self.video.surface(terminal, displayed);
                let cursor = self.terminals.cursor_mut(terminal);
                crate::drivers::vga::write_bytes(surface, cursor, source);
                if terminal == displayed {
                    crate::drivers::vga::move_hardware_cursor(*cursor);
                }
                Ok(nbytes as i32)
            }
            FileKind::Rtc { .. } => {
                if nbytes != 4 {
                    return Err(SysError::InvalidArgument);
                }
                let bytes = self.user.slice(buf, 4)?;
                let frequency = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                if !self.rtc.set_frequency(frequency) {
                    log::debug!("[RTC] ignoring frequency {}", frequency);
                }
                Ok(4)
            }
            FileKind::Regular { .. } | FileKind::Directory => Err(SysError::InvalidArgument),
        }
    }

    pub(super) fn sys_open(&mut self, filename: u32) -> SysResult<i32> {
        let fd = self.current_pcb_mut()?.files.first_free()?;
        let dentry = {
            let name = self.user.c_string(filename, FILENAME_LEN).map_err(|_| SysError::NotFound)?;
            self.fs.read_dentry_by_name(name)?
        };
        let kind = match dentry.file_type {
            FileType::Rtc => {
                self.rtc.set_frequency(crate::config::RTC_DEFAULT_FREQUENCY);
                FileKind::Rtc { wake_at: None }
            }
            FileType::Directory => FileKind::Directory,
            FileType::Regular => FileKind::Regular { inode: dentry.inode },
        };
        self.current_pcb_mut()?.files.install(fd, OpenFile::new(kind));
        Ok(fd as i32)
    }

    pub(super) fn sys_close(&mut self, fd: i32) -> SysResult<i32> {
        self.current_pcb_mut()?.files.close(fd)?;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::USER_BASE;
    use crate::drivers::terminal::TerminalId;
    use crate::drivers::vga;
    use crate::task::Pid;
    use crate::testutil;

    fn open(kernel: &mut Kernel, caller: crate::task::SavedContext, name: &str) -> Outcome {
        let at = testutil::put_string(kernel, 0x1000, name);
        kernel.syscall(caller, SYSCALL_OPEN, [at, 0, 0])
    }

    #[test]
    fn six_opens_fill_the_table() {
        let mut kernel = testutil::booted();
        let caller = testutil::user_frame(&mut kernel, Pid::BOOT);
        for expected in 2..8 {
            assert_eq!(open(&mut kernel, caller, "frame0.txt"), Outcome::Return(expected));
        }
        assert_eq!(open(&mut kernel, caller, "frame0.txt"), Outcome::Return(-1));
        assert_eq!(kernel.current_pcb_mut().unwrap().files.first_free(), Err(SysError::ResourceExhausted));

        assert_eq!(kernel.syscall(caller, SYSCALL_CLOSE, [3, 0, 0]), Outcome::Return(0));
        assert_eq!(kernel.syscall(caller, SYSCALL_CLOSE, [3, 0, 0]), Outcome::Return(-1));
        assert_eq!(kernel.syscall(caller, SYSCALL_CLOSE, [1, 0, 0]), Outcome::Return(-1));
        assert_eq!(open(&mut kernel, caller, "nosuchfile"), Outcome::Return(-1));
        assert_eq!(open(&mut kernel, caller, "."), Outcome::Return(3));
    }

    #[test]
    fn standard_descriptors_are_one_way() {
        let mut kernel = testutil::booted();
        let caller = testutil::user_frame(&mut kernel, Pid::BOOT);
        let buf = testutil::put_string(&mut kernel, 0x1000, "hi");
        assert_eq!(kernel.syscall(caller, SYSCALL_WRITE, [0, buf, 2]), Outcome::Return(-1));
        assert_eq!(kernel.syscall(caller, SYSCALL_READ, [1, buf, 2]), Outcome::Return(-1));
        assert_eq!(kernel.syscall(caller, SYSCALL_READ, [8, buf, 2]), Outcome::Return(-1));
        assert_eq!(kernel.syscall(caller, SYSCALL_WRITE, [5, buf, 2]), Outcome::Return(-1));
    }

    #[test]
    fn terminal_write_draws_on_the_screen() {
        let mut kernel = testutil::booted();
        let caller = testutil::user_frame(&mut kernel, Pid::BOOT);
        let buf = testutil::put_string(&mut kernel, 0x1000, "391OS> ");
        assert_eq!(kernel.syscall(caller, SYSCALL_WRITE, [1, buf, 7]), Outcome::Return(7));
        assert_eq!(kernel.video.screen()[0], vga::cell(b'3'));
        assert_eq!(kernel.video.screen()[6], vga::cell(b' '));
        assert_eq!(kernel.terminals.cursor(TerminalId::FIRST).x, 7);
    }

    #[test]
    fn background_terminal_writes_to_its_buffer() {
        let mut kernel = testutil::booted();
        let t1 = TerminalId::new(1).unwrap();
        kernel.switch_terminal(t1);
        kernel.switch_terminal(TerminalId::FIRST);
        testutil::rotate_to(&mut kernel, t1);
        let pid1 = Pid::new(1).unwrap();
        let caller = testutil::user_frame(&mut kernel, pid1);

        let buf = testutil::put_string(&mut kernel, 0x1000, "x");
        let before = kernel.video.screen().to_vec();
        assert_eq!(kernel.syscall(caller, SYSCALL_WRITE, [1, buf, 1]), Outcome::Return(1));
        assert_eq!(kernel.video.screen(), &before[..]);
        assert_eq!(kernel.video.buffer(t1)[0], vga::cell(b'x'));
    }

    #[test]
    fn terminal_read_blocks_until_enter() {
        let mut kernel = testutil::booted();
        let caller = testutil::user_frame(&mut kernel, Pid::BOOT);
        let buf = USER_BASE as u32 + 0x2000;
        assert_eq!(kernel.syscall(caller, SYSCALL_READ, [0, buf, 128]), Outcome::Block);

        for &scancode in &[0x26, 0xA6, 0x1F, 0x9F, 0x1C, 0x9C] {
            kernel.handle_scancode(scancode);
        }
        assert_eq!(kernel.syscall(caller, SYSCALL_READ, [0, buf, 128]), Outcome::Return(3));
        assert_eq!(kernel.user.slice(buf, 3).unwrap(), b"ls\n");
        assert_eq!(kernel.syscall(caller, SYSCALL_READ, [0, buf, 128]), Outcome::Block);
    }

    #[test]
    fn file_reads_advance_the_position() {
        let mut kernel = testutil::booted();
        let caller = testutil::user_frame(&mut kernel, Pid::BOOT);
        assert_eq!(open(&mut kernel, caller, "frame0.txt"), Outcome::Return(2));
        let buf = USER_BASE as u32 + 0x2000;
        let len = testutil::FRAME0.len() as u32;

        assert_eq!(kernel.syscall(caller, SYSCALL_READ, [2, buf, 5]), Outcome::Return(5));
        assert_eq!(kernel.syscall(caller, SYSCALL_READ, [2, buf + 5, 1000]), Outcome::Return(len as i32 - 5));
        assert_eq!(kernel.user.slice(buf, len as usize).unwrap(), testutil::FRAME0);
        assert_eq!(kernel.syscall(caller, SYSCALL_READ, [2, buf, 1000]), Outcome::Return(0));
        assert_eq!(kernel.syscall(caller, SYSCALL_READ, [2, buf, -1i32 as u32]), Outcome::Return(-1));
    }

    #[test]
    fn directory_reads_list_every_name() {
        let mut kernel = testutil::booted();
        let caller = testutil::user_frame(&mut kernel, Pid::BOOT);
        assert_eq!(open(&mut kernel, caller, "."), Outcome::Return(2));
        let buf = USER_BASE as u32 + 0x2000;

        let mut names = Vec::new();
        loop {
            match kernel.syscall(caller, SYSCALL_READ, [2, buf, 32]) {
                Outcome::Return(0) => break,
                Outcome::Return(n) if n > 0 => {
                    names.push(String::from_utf8(kernel.user.slice(buf, n as usize).unwrap().to_vec()).unwrap())
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(names.len(), kernel.fs.dentry_count() as usize);
        assert_eq!(names[0], ".");
        assert!(names.iter().any(|n| n == "shell"));
        assert!(names.iter().any(|n| n.len() == 32));

        assert_eq!(kernel.syscall(caller, SYSCALL_WRITE, [2, buf, 4]), Outcome::Return(-1));
    }

    #[test]
    fn rtc_read_waits_for_the_next_interrupt() {
        let mut kernel = testutil::booted();
        let caller = testutil::user_frame(&mut kernel, Pid::BOOT);
        assert_eq!(open(&mut kernel, caller, "rtc"), Outcome::Return(2));
        let buf = USER_BASE as u32 + 0x2000;

        assert_eq!(kernel.syscall(caller, SYSCALL_READ, [2, buf, 4]), Outcome::Block);
        assert_eq!(kernel.syscall(caller, SYSCALL_READ, [2, buf, 4]), Outcome::Block);
        kernel.rtc_mut().interrupt();
        assert_eq!(kernel.syscall(caller, SYSCALL_READ, [2, buf, 4]), Outcome::Return(0));
        assert_eq!(kernel.syscall(caller, SYSCALL_READ, [2, buf, 4]), Outcome::Block);
    }

    #[test]
    fn rtc_write_takes_four_bytes() {
        let mut kernel = testutil::booted();
        let caller = testutil::user_frame(&mut kernel, Pid::BOOT);
        assert_eq!(open(&mut kernel, caller, "rtc"), Outcome::Return(2));
        let buf = USER_BASE as u32 + 0x2000;

        kernel.user.slice_mut(buf, 4).unwrap().copy_from_slice(&32u32.to_le_bytes());
        assert_eq!(kernel.syscall(caller, SYSCALL_WRITE, [2, buf, 4]), Outcome::Return(4));
        assert_eq!(kernel.rtc_mut().frequency(), 32);

        kernel.user.slice_mut(buf, 4).unwrap().copy_from_slice(&33u32.to_le_bytes());
        assert_eq!(kernel.syscall(caller, SYSCALL_WRITE, [2, buf, 4]), Outcome::Return(4));
        assert_eq!(kernel.rtc_mut().frequency(), 32);
        assert_eq!(kernel.syscall(caller, SYSCALL_WRITE, [2, buf, 2]), Outcome::Return(-1));

        assert_eq!(open(&mut kernel, caller, "rtc"), Outcome::Return(3));
        assert_eq!(kernel.rtc_mut().frequency(), 2);
    }
}
