#![no_std]
#![no_main]

//! Counts at 8Hz off the real-time clock, mirroring the count in the top
//! right corner of the screen through vidmap.

use user_lib::{args, println, sys_close, sys_open, sys_read, sys_vidmap, sys_write, MAX_COMMAND};

const RATE: u32 = 8;
const SCREEN_COLS: usize = 80;
const ATTRIBUTE: u16 = 0x0E00;

fn parse(text: &[u8]) -> Option<u32> {
    text.iter().try_fold(0u32, |acc, &b| {
        b.is_ascii_digit().then(|| acc.saturating_mul(10).saturating_add((b - b'0') as u32))
    })
}

#[no_mangle]
pub fn main() -> i32 {
    let mut arg_buf = [0u8; MAX_COMMAND];
    let limit = match args(&mut arg_buf) {
        Some(text) => match parse(text) {
            Some(limit) => limit,
            None => {
                println!("usage: counter [count]");
                return 3;
            }
        },
        None => 16,
    };

    let rtc = sys_open(b"rtc");
    if rtc == -1 {
        println!("rtc open failed");
        return 2;
    }
    sys_write(rtc, &RATE.to_ne_bytes());
    let screen = sys_vidmap();

    let mut tick = [0u8; 4];
    for count in 1..=limit {
        sys_read(rtc, &mut tick);
        println!("{}", count);
        if let Some(screen) = screen {
            let mut value = count;
            for col in (SCREEN_COLS - 10..SCREEN_COLS).rev() {
                let digit = b'0' + (value % 10) as u8;
                unsafe { screen.add(col).write_volatile(ATTRIBUTE | digit as u16) };
                value /= 10;
            }
        }
    }
    sys_close(rtc);
    0
}
