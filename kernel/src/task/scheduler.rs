//! Scheduler
//!
//! Round-robin over the active terminals, one terminal per timer tick. The
//! process that runs on a terminal is always its foreground process.

use super::SavedContext;
use crate::state::Kernel;

impl Kernel {
    /// Timer tick: park the interrupted process and return the context of the
    /// next active terminal's foreground process.
    pub fn tick(&mut self, interrupted: SavedContext) -> SavedContext {
        if let Some(pid) = self.current {
            self.processes.pcb_mut(pid).sched_context = Some(interrupted);
        }

        let scheduled = self.terminals.scheduled();
        let Some(next) = self.terminals.next_active(scheduled) else {
            return interrupted;
        };
        let Some(pid) = self.terminals.get(next).foreground() else {
            return interrupted;
        };
        let Some(resume) = self.processes.pcb(pid).sched_context else {
            log::warn!("[Sched] pid {} has no saved context", pid);
            return interrupted;
        };

        self.terminals.schedule(next);
        self.map_user(pid);
        let target = self.display_target(next);
        self.space.remap_display_target(target);
        self.current = Some(pid);
        self.kernel_stack = self.processes.kernel_stack_top(pid);
        resume
    }
}

#[cfg(test)]
mod tests {
    use crate::drivers::terminal::TerminalId;
    use crate::mm::{PhysAddr, VirtAddr, VIDEO, VIDMAP_ADDR};
    use crate::task::Pid;
    use crate::testutil;

    #[test]
    fn single_terminal_keeps_running() {
        let mut kernel = testutil::booted();
        let frame = testutil::user_frame(&mut kernel, Pid::BOOT);
        assert_eq!(kernel.tick(frame), frame);
        assert_eq!(kernel.current(), Some(Pid::BOOT));
    }

    #[test]
    fn every_active_terminal_runs_within_three_ticks() {
        let mut kernel = testutil::booted();
        kernel.switch_terminal(TerminalId::new(1).unwrap());
        kernel.switch_terminal(TerminalId::new(2).unwrap());

        let mut seen = [false; 3];
        for _ in 0..3 {
            let pid = kernel.current().unwrap();
            let frame = testutil::user_frame(&mut kernel, pid);
            kernel.tick(frame);
            seen[kernel.terminals.scheduled().index()] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn preempted_context_round_trips() {
        let mut kernel = testutil::booted();
        let t1 = TerminalId::new(1).unwrap();
        kernel.switch_terminal(t1);

        let suspended = testutil::user_frame(&mut kernel, Pid::BOOT);
        let parked = kernel.tick(suspended);
        assert_eq!(kernel.current(), Pid::new(1));
        assert_eq!(kernel.processes.frame_mut(parked).unwrap().eip(), testutil::SHELL_ENTRY);

        let mut ticks = 0;
        let mut frame = parked;
        loop {
            ticks += 1;
            frame = kernel.tick(frame);
            if kernel.current() == Some(Pid::BOOT) {
                break;
            }
        }
        assert_eq!(ticks, 1);
        assert_eq!(frame, suspended);
        assert_eq!(kernel.user.mapped(), Pid::BOOT);
        assert_eq!(kernel.kernel_stack(), kernel.processes.kernel_stack_top(Pid::BOOT));
    }

    #[test]
    fn display_page_follows_the_scheduled_terminal() {
        let mut kernel = testutil::booted();
        let t1 = TerminalId::new(1).unwrap();
        kernel.switch_terminal(t1);
        kernel.switch_terminal(TerminalId::FIRST);

        testutil::rotate_to(&mut kernel, t1);
        let buffer = crate::mm::terminal_buffer(1);
        assert_eq!(kernel.space.translate(VirtAddr::new(VIDMAP_ADDR)), Some(buffer));
        assert_eq!(kernel.space.translate(VirtAddr::new(VIDEO)), Some(buffer));

        testutil::rotate_to(&mut kernel, TerminalId::FIRST);
        assert_eq!(kernel.space.translate(VirtAddr::new(VIDMAP_ADDR)), Some(PhysAddr::new(VIDEO)));
    }
}
