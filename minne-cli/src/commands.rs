//! Interactive command surface over the allocator.
//!
//! Line-oriented REPL: `ALLOCATE|A <n>`, `FREE|F <id>`, `LIST|L`, `STATE|S`,
//! `PROBE|P <ptr>`, `EXIT|E`, case-insensitive. Commands are thin glue over
//! `minne-core`; they print its return values and hold no allocation logic.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::ptr::NonNull;
use std::str::FromStr;

use clap::Parser;

use minne_core::{Heap, Strategy};

const PROMPT: &str = "minne> ";
const SMALL_BLOCK_THRESHOLD: usize = 16;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Interactive REPL for exercising the minne arena allocator")]
pub struct Cli {
    /// Number of bytes managed by the allocator (default 1024)
    #[arg(short = 'n', long)]
    pub size: Option<usize>,

    /// Placement strategy: first-fit, best-fit, worst-fit or next-fit
    #[arg(short, long, value_parser = Strategy::from_str)]
    pub strategy: Option<Strategy>,

    /// Optional YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Continue,
    ContinueWithState,
    Exit,
}

struct Allocation {
    id: usize,
    ptr: NonNull<u8>,
    size: usize,
}

/// One REPL session over a heap: dispatches commands and tracks live
/// allocations under caller-facing ids.
pub struct Session<'h> {
    heap: &'h mut Heap,
    allocations: Vec<Allocation>,
    id_sequence: usize,
}

impl<'h> Session<'h> {
    pub fn new(heap: &'h mut Heap) -> Self {
        Session {
            heap,
            allocations: Vec::new(),
            id_sequence: 0,
        }
    }

    fn handle_line(&mut self, line: &str, out: &mut impl Write) -> io::Result<Outcome> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Outcome::Continue);
        };
        let args: Vec<&str> = words.collect();

        match command.to_ascii_uppercase().as_str() {
            "ALLOCATE" | "A" => self.handle_allocate(&args, out),
            "FREE" | "F" => self.handle_free(&args, out),
            "LIST" | "L" => self.handle_list(&args, out),
            "STATE" | "S" => Ok(Outcome::ContinueWithState),
            "PROBE" | "P" => self.handle_probe(&args, out),
            "EXIT" | "E" => Ok(Outcome::Exit),
            unknown => {
                writeln!(out, "invalid command: {unknown}")?;
                Ok(Outcome::Continue)
            }
        }
    }

    fn handle_allocate(&mut self, args: &[&str], out: &mut impl Write) -> io::Result<Outcome> {
        let Some(size) = single_arg(args).and_then(|arg| parse_positive(arg)) else {
            writeln!(out, "USAGE:\n\tALLOCATE <n>\n\n\t<n> - allocation size in bytes")?;
            return Ok(Outcome::Continue);
        };

        match self.heap.allocate(size) {
            Ok(ptr) => {
                // Scribble over the payload so stale reads are obvious.
                unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0xFE, size) };

                self.id_sequence += 1;
                let id = self.id_sequence;
                self.allocations.push(Allocation { id, ptr, size });

                writeln!(out, "ALLOCATION: {id}")?;
                Ok(Outcome::ContinueWithState)
            }
            Err(err) => {
                writeln!(out, "{err}")?;
                Ok(Outcome::Continue)
            }
        }
    }

    fn handle_free(&mut self, args: &[&str], out: &mut impl Write) -> io::Result<Outcome> {
        let Some(id) = single_arg(args).and_then(|arg| parse_positive(arg)) else {
            writeln!(out, "USAGE:\n\tFREE <id>\n\n\t<id> - id of the allocation to release")?;
            return Ok(Outcome::Continue);
        };

        match self.allocations.iter().position(|a| a.id == id) {
            Some(index) => {
                let allocation = self.allocations.remove(index);
                self.heap.free(allocation.ptr);
                Ok(Outcome::ContinueWithState)
            }
            None => {
                writeln!(out, "no allocation with id: {id}")?;
                Ok(Outcome::Continue)
            }
        }
    }

    fn handle_list(&mut self, args: &[&str], out: &mut impl Write) -> io::Result<Outcome> {
        if !args.is_empty() {
            writeln!(out, "USAGE:\n\tLIST")?;
            return Ok(Outcome::Continue);
        }

        for allocation in &self.allocations {
            let begin = allocation.ptr.as_ptr();
            let end = unsafe { begin.add(allocation.size) };
            writeln!(
                out,
                "[{}] {begin:p} .. {end:p} (size = {})",
                allocation.id, allocation.size
            )?;
        }
        Ok(Outcome::Continue)
    }

    fn handle_probe(&mut self, args: &[&str], out: &mut impl Write) -> io::Result<Outcome> {
        let Some(addr) = single_arg(args).and_then(parse_address) else {
            writeln!(
                out,
                "USAGE:\n\tPROBE <ptr>\n\n\t<ptr> - decimal or 0x-prefixed address to test\n\t        for membership in an allocated payload"
            )?;
            return Ok(Outcome::Continue);
        };

        let ptr = addr as *mut u8;
        if self.heap.is_allocated(ptr) {
            // Membership proven, so the byte is caller-writable.
            unsafe { *ptr = 0x42 };
            writeln!(out, "TRUE")?;
        } else {
            writeln!(out, "FALSE")?;
        }
        Ok(Outcome::Continue)
    }

    /// The report printed after any state-changing command.
    fn state_report(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "# free_block_count()          == {}", self.heap.free_block_count())?;
        writeln!(out, "# allocated_block_count()     == {}", self.heap.allocated_block_count())?;
        writeln!(out, "# free_bytes()                == {}", self.heap.free_bytes())?;
        writeln!(out, "# biggest_free_block_size()   == {}", self.heap.biggest_free_block_size())?;
        writeln!(
            out,
            "# count_small_free_blocks({SMALL_BLOCK_THRESHOLD})  == {}",
            self.heap.count_small_free_blocks(SMALL_BLOCK_THRESHOLD)
        )?;
        writeln!(out, "# print_state()               => {}", self.heap)?;
        Ok(())
    }
}

fn single_arg<'a>(args: &[&'a str]) -> Option<&'a str> {
    match args {
        [only] => Some(only),
        _ => None,
    }
}

fn parse_positive(arg: &str) -> Option<usize> {
    arg.parse::<usize>().ok().filter(|n| *n > 0)
}

fn parse_address(arg: &str) -> Option<usize> {
    let parsed = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => arg.parse::<usize>(),
    };
    parsed.ok().filter(|addr| *addr != 0)
}

/// Drives the session until `EXIT` or end of input.
pub fn repl(heap: &mut Heap, input: impl BufRead, mut out: impl Write) -> io::Result<()> {
    let mut session = Session::new(heap);

    write!(out, "{PROMPT}")?;
    out.flush()?;

    for line in input.lines() {
        let line = line?;
        match session.handle_line(&line, &mut out)? {
            Outcome::Continue => {}
            Outcome::ContinueWithState => session.state_report(&mut out)?,
            Outcome::Exit => break,
        }
        write!(out, "{PROMPT}")?;
        out.flush()?;
    }
    Ok(())
}
