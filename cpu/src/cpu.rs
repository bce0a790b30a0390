// SPDX-License-Identifier: MPL-2.0

//! The interpreter.

mod alu;
mod branch;
mod call;
mod decimal;
mod field;
mod string;
mod syscall;

use std::{fmt, io::{self, Write}};

use vaxrun_aout::{AOut, SymbolTable};

use crate::{
    disasm::Disassembler,
    exc::{self, Fault},
    instr::{self, Instr, Op},
    mem::{self, Cursor},
    opn::Specifier,
    reg,
    Memory,
};

pub use alu::Width;

/// Interpreter settings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// The size, in bytes, of guest memory, which holds the program image and the stack.
    pub mem_size: usize,
}

impl Config {
    pub const DEFAULT_MEM_SIZE: usize = 0x40000;
}

impl Default for Config {
    fn default() -> Self {
        Self { mem_size: Self::DEFAULT_MEM_SIZE }
    }
}

#[derive(Debug)]
pub enum LoadError {
    /// The container has no header, so it has neither an entry point nor a layout.
    NotExecutable,
    /// The program image and its initial stack do not fit in memory.
    ImageTooLarge { needed: u64, available: usize },
    Memory(mem::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotExecutable => f.write_str("not an executable"),
            Self::ImageTooLarge { needed, available } => write!(
                f,
                "program needs {:#x} bytes of memory but only {:#x} are available",
                needed, available,
            ),
            Self::Memory(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<mem::Error> for LoadError {
    fn from(e: mem::Error) -> Self {
        Self::Memory(e)
    }
}

/// How a program stopped without faulting.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Halt {
    /// The program called `exit`.
    Exit(i32),
    /// The program returned from its entry procedure, leaving this value in `r0`.
    Return(u32),
}

impl Halt {
    /// The process exit status this halt corresponds to.
    pub fn status(&self) -> i32 {
        match *self {
            Self::Exit(code) => code,
            Self::Return(r0) => r0 as i32,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Status {
    NotStarted,
    Running,
    Halted(Halt),
    Faulted(Fault),
}

/// An entry of the call stack kept for diagnostics.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    /// The entry address of the procedure.
    pub addr: u32,
    /// The name of the procedure, or `???`.
    pub name: String,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}({})", self.addr, self.name)
    }
}

/// Where an operand lives once its specifier has been evaluated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Location {
    /// A literal, or a branch target.
    Value(u64),
    Register(u8),
    Memory(u32),
}

impl Cpu {
    /// Loads an executable and prepares its initial stack.
    ///
    /// `args` becomes the program's `argv`, and so conventionally begins with the program path.
    pub fn load(aout: &AOut, args: &[impl AsRef<str>], config: &Config) -> Result<Self, LoadError> {
        let header = aout.header.ok_or(LoadError::NotExecutable)?;

        let image_len = u64::from(header.data_offset())
            + aout.data.len() as u64
            + u64::from(aout.bss_len());
        let stack_len = args.iter().map(|it| it.as_ref().len() as u64 + 1).sum::<u64>()
            + 3
            + 4 * (args.len() as u64 + 3);
        if image_len + stack_len > config.mem_size as u64 {
            return Err(LoadError::ImageTooLarge {
                needed: image_len + stack_len,
                available: config.mem_size,
            });
        }

        let mut mem = Memory::new(header.base(), config.mem_size);
        mem.load(header.base(), &aout.text)?;
        mem.load(aout.data_addr(), &aout.data)?;

        let mut cpu = Self {
            reg: reg::File::default(),
            mem,
            symbols: aout.symbols.clone(),
            entry: header.entry,
            status: Status::NotStarted,
            frames: Vec::new(),
            stdout: Box::new(io::stdout()),
            instr_addr: header.entry,
        };
        *cpu.reg.pc_mut() = header.entry;
        cpu.set_args(args)?;
        tracing::debug!(
            "loaded {:#x} bytes at {:08x}; entry = {:08x}, sp = {:08x}",
            image_len,
            header.base(),
            header.entry,
            cpu.reg.sp(),
        );

        Ok(cpu)
    }

    /// Lays out `argc`, `argv`, and the argument strings at the top of memory.
    fn set_args(&mut self, args: &[impl AsRef<str>]) -> Result<(), mem::Error> {
        let argc = args.len() as u32;
        let strings_len = args.iter().map(|it| it.as_ref().len() as u32 + 1).sum::<u32>();
        let mut string_addr = self.mem.top().wrapping_sub(strings_len) & !3;

        // `argv` is terminated by a null pointer, and an empty environment follows it.
        self.mem.write_64(string_addr.wrapping_sub(8), 0)?;
        let mut argv = string_addr.wrapping_sub((argc + 2) * 4);
        let sp = argv.wrapping_sub(4);
        self.mem.write_32(sp, argc)?;

        for arg in args {
            let bytes = arg.as_ref().as_bytes();
            self.mem.write_32(argv, string_addr)?;
            argv = argv.wrapping_add(4);
            self.mem.load(string_addr, bytes)?;
            string_addr = string_addr.wrapping_add(bytes.len() as u32);
            self.mem.write_8(string_addr, 0)?;
            string_addr = string_addr.wrapping_add(1);
        }
        *self.reg.sp_mut() = sp;

        Ok(())
    }
}

/// A VAX processor running one user-mode program.
pub struct Cpu {
    reg: reg::File,
    mem: Memory,
    symbols: SymbolTable,
    entry: u32,
    status: Status,
    /// The call stack, entry procedure first.
    frames: Vec<Frame>,
    /// Where the `write` system call sends its output.
    stdout: Box<dyn Write>,
    /// The address of the instruction being executed.
    instr_addr: u32,
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("reg", &self.reg)
            .field("mem", &self.mem)
            .field("status", &self.status)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl Cpu {
    /// The register file.
    pub fn reg(&self) -> &reg::File {
        &self.reg
    }

    pub fn mem(&self) -> &Memory {
        &self.mem
    }

    pub fn mem_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// The call stack, entry procedure first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Redirects the output of the `write` system call.
    pub fn set_stdout(&mut self, stdout: Box<dyn Write>) {
        self.stdout = stdout;
    }

    pub fn disassembler(&self) -> Disassembler<'_> {
        Disassembler::new(&self.mem, &self.symbols, Some(self.entry))
    }

    /// Enters the program: the entry procedure joins the call stack and its register mask is
    /// skipped.
    ///
    /// This does nothing if the program has already started.
    pub fn start(&mut self) {
        if self.status != Status::NotStarted {
            return;
        }

        self.push_frame(self.reg.pc());
        *self.reg.pc_mut() = self.reg.pc().wrapping_add(2);
        self.status = Status::Running;
    }

    /// Runs until the program halts or faults.
    pub fn run(&mut self) -> Result<Halt, Fault> {
        loop {
            if let Some(halt) = self.step()? {
                return Ok(halt);
            }
        }
    }

    /// Executes one instruction, starting the program first if need be.
    ///
    /// Once the program has halted or faulted, every further step reports the same outcome.
    pub fn step(&mut self) -> Result<Option<Halt>, Fault> {
        match &self.status {
            Status::NotStarted => self.start(),
            Status::Running => {}
            Status::Halted(halt) => return Ok(Some(*halt)),
            Status::Faulted(fault) => return Err(fault.clone()),
        }

        let result = self.execute_next();
        match &result {
            Ok(None) => return result,
            Ok(Some(halt)) => self.status = Status::Halted(*halt),
            Err(fault) => self.status = Status::Faulted(fault.clone()),
        }
        if let Err(e) = self.stdout.flush() {
            tracing::warn!("failed to flush output: {}", e);
        }

        result
    }

    fn execute_next(&mut self) -> Result<Option<Halt>, Fault> {
        let addr = self.reg.pc();
        self.instr_addr = addr;
        tracing::trace!("{} {}", self.reg.flags(), self.trace_line(addr));

        let instr = self.fetch(addr)?;
        *self.reg.pc_mut() = instr.next_addr();

        self.execute(&instr)
    }

    fn trace_line(&self, addr: u32) -> String {
        let regs = (0..16)
            .map(|idx| format!("{:08x}", self.reg.get(idx)))
            .collect::<Vec<String>>()
            .join(" ");
        let text = self
            .disassembler()
            .decode_one(addr)
            .map_or_else(|e| e.to_string(), |it| it.text);

        format!("{} {}", regs, text)
    }

    /// Fetches and decodes the instruction at `addr`.
    ///
    /// Unlike the disassembler, an unknown opcode byte that is not an escape byte is reported on
    /// its own, without fetching a second byte.
    fn fetch(&self, addr: u32) -> Result<Instr, Fault> {
        let catalog = instr::catalog();
        let mut cursor = Cursor::new(&self.mem, addr);
        let first = cursor.fetch_8().map_err(|e| self.mem_fault(e))?;

        let desc = match catalog.get(u16::from(first)) {
            Some(desc) => desc,
            None if instr::is_escape(first) => {
                let second = cursor.fetch_8().map_err(|e| self.mem_fault(e))?;
                let code = u16::from(first) << 8 | u16::from(second);

                catalog
                    .get(code)
                    .ok_or_else(|| self.fault(exc::Kind::UnknownOpcode { code, len: 2 }))?
            }
            None => {
                return Err(self.fault(exc::Kind::UnknownOpcode { code: first.into(), len: 1 }));
            }
        };

        Instr::decode(addr, desc, &mut cursor).map_err(|e| self.mem_fault(e))
    }

    fn execute(&mut self, instr: &Instr) -> Result<Option<Halt>, Fault> {
        use alu::Arith;
        use Op::*;

        let result = match instr.op() {
            Op::Halt => Err(self.fault(exc::Kind::PrivilegedInstr { mnemonic: instr.desc.mnemonic })),
            Nop => Ok(()),

            Addb2 | Addb3 | Addw2 | Addw3 | Addl2 | Addl3 => self.arith(instr, Arith::Add),
            Subb2 | Subb3 | Subw2 | Subw3 | Subl2 | Subl3 => self.arith(instr, Arith::Sub),
            Mulb2 | Mulb3 | Mulw2 | Mulw3 | Mull2 | Mull3 => self.arith(instr, Arith::Mul),
            Divb2 | Divb3 | Divw2 | Divw3 | Divl2 | Divl3 => self.arith(instr, Arith::Div),
            Bisb2 | Bisb3 | Bisw2 | Bisw3 | Bisl2 | Bisl3 => self.arith(instr, Arith::Bis),
            Bicb2 | Bicb3 | Bicw2 | Bicw3 | Bicl2 | Bicl3 => self.arith(instr, Arith::Bic),
            Xorb2 | Xorb3 | Xorw2 | Xorw3 | Xorl2 | Xorl3 => self.arith(instr, Arith::Xor),
            Movb | Movw | Movl | Movq => self.mov(instr),
            Cmpb | Cmpw | Cmpl => self.cmp(instr),
            Tstb | Tstw | Tstl => self.tst(instr),
            Clrb | Clrw | Clrl | Clrq => self.clr(instr),
            Incb | Incw | Incl => self.inc(instr),
            Decb | Decw | Decl => self.dec(instr),
            Mnegb | Mnegw | Mnegl => self.mneg(instr),
            Mcomb | Mcomw | Mcoml => self.mcom(instr),
            Bitb | Bitw | Bitl => self.bit(instr),
            Movzbw | Movzbl | Movzwl => self.movz(instr),
            Cvtbw | Cvtbl | Cvtwb | Cvtwl | Cvtlb | Cvtlw => self.cvt(instr),
            Movab | Movaw | Moval | Movaq => self.mova(instr),
            Pushab | Pushaw | Pushal | Pushaq => self.pusha(instr),
            Pushl => self.pushl(instr),
            Ashl => self.ashl(instr),

            Brb | Brw | Bneq | Beql | Bgtr | Bleq | Bgeq | Blss | Bgtru | Blequ | Bvc | Bvs
            | Bcc | Blssu => self.branch(instr),
            Jmp => self.jmp(instr),
            Bsbb | Bsbw => self.bsb(instr),
            Jsb => self.jsb(instr),
            Rsb => self.rsb(),
            Bbs | Bbc | Bbss | Bbcs | Bbsc | Bbcc | Bbssi | Bbcci => self.bit_branch(instr),
            Blbs | Blbc => self.blb(instr),
            Acbb | Acbw | Acbl => self.acb(instr),
            Aoblss | Aobleq => self.aob(instr),
            Sobgeq | Sobgtr => self.sob(instr),
            Caseb | Casew | Casel => self.case(instr),

            Extv | Extzv => self.ext(instr),
            Calls => self.calls(instr),
            Ret => return self.ret(),
            Cvtlp => self.cvtlp(instr),
            Editpc => self.editpc(instr),
            Locc | Skpc => self.locc(instr),
            Movc3 => self.movc3(instr),
            Chmk => return self.chmk(instr),

            _ => Err(self.fault(exc::Kind::Unimplemented {
                code: instr.desc.code,
                mnemonic: instr.desc.mnemonic,
            })),
        };

        result.map(|()| None)
    }

    /// Renders a fault as a multi-line report: the fault itself, the call stack, the faulting
    /// instruction, and the registers.
    pub fn diagnose(&self, fault: &Fault) -> String {
        let mut out = format!("{}\n", fault);
        if !self.frames.is_empty() {
            out.push_str(&self.call_chain(|it| it.to_string()));
            out.push('\n');
        }

        let listing = match self.disassembler().decode_one(fault.addr) {
            Ok(decoded) => self
                .mem
                .slice(fault.addr, decoded.len)
                .map(|bytes| vaxrun_util::listing(fault.addr, bytes, &decoded.text))
                .ok(),
            Err(_) => None,
        };
        if let Some(listing) = listing {
            out.push_str(&listing);
            out.push('\n');
        }
        out.push_str(&self.reg.to_string());

        out
    }

    fn call_chain(&self, render: impl Fn(&Frame) -> String) -> String {
        self.frames.iter().map(render).collect::<Vec<String>>().join(" > ")
    }

    fn push_frame(&mut self, addr: u32) {
        let name = self.symbols.procedure_at(addr).unwrap_or("???").to_string();
        self.frames.push(Frame { addr, name });
    }

    fn fault(&self, kind: exc::Kind) -> Fault {
        Fault::new(self.instr_addr, kind)
    }

    fn mem_fault(&self, e: mem::Error) -> Fault {
        self.fault(exc::Kind::Memory(e))
    }
}

impl Cpu {
    /// Evaluates a specifier whose operand is `size` bytes long, applying its register side
    /// effects.
    pub fn locate(&mut self, spec: &Specifier, size: u32) -> Result<Location, Fault> {
        let loc = match spec {
            Specifier::Literal(byte) => Location::Value(u64::from(*byte)),
            Specifier::Branch(target) => Location::Value(u64::from(*target)),
            Specifier::Register(reg) => Location::Register(*reg),
            Specifier::Deferred(reg) => Location::Memory(self.reg.get(usize::from(*reg))),
            Specifier::AutoDecrement(reg) => {
                let value = self.reg.get_mut(usize::from(*reg));
                *value = value.wrapping_sub(size);

                Location::Memory(*value)
            }
            Specifier::AutoIncrement(reg) => {
                let value = self.reg.get_mut(usize::from(*reg));
                let addr = *value;
                *value = value.wrapping_add(size);

                Location::Memory(addr)
            }
            // The value sits in the instruction stream, which is ordinary memory.
            Specifier::Immediate { addr, .. } => Location::Memory(*addr),
            Specifier::AutoIncrementDeferred(reg) => {
                let value = self.reg.get_mut(usize::from(*reg));
                let ptr = *value;
                *value = value.wrapping_add(4);

                Location::Memory(self.read_mem_32(ptr)?)
            }
            Specifier::Absolute(addr) => Location::Memory(*addr),
            Specifier::Displacement { reg, disp, deferred } => {
                let addr = self.reg.get(usize::from(*reg)).wrapping_add(*disp as u32);

                Location::Memory(self.defer(addr, *deferred)?)
            }
            Specifier::Relative { target, deferred } => {
                Location::Memory(self.defer(*target, *deferred)?)
            }
            Specifier::Index { base, reg } => {
                let base_loc = match **base {
                    // Immediate data has no address to index from.
                    Specifier::Immediate { .. } => None,
                    _ => Some(self.locate(base, size)?),
                };
                let Some(Location::Memory(base_addr)) = base_loc else {
                    return Err(self.fault(exc::Kind::AddressingMode { specifier: 0x40 | reg }));
                };
                let offset = self.reg.get(usize::from(*reg)).wrapping_mul(size);

                Location::Memory(base_addr.wrapping_add(offset))
            }
            Specifier::Reserved(byte) => {
                return Err(self.fault(exc::Kind::AddressingMode { specifier: *byte }));
            }
        };

        Ok(loc)
    }

    fn defer(&self, addr: u32, deferred: bool) -> Result<u32, Fault> {
        if deferred {
            self.read_mem_32(addr)
        } else {
            Ok(addr)
        }
    }

    /// Evaluates every operand of `instr`, in order.
    fn locate_all<const N: usize>(&mut self, instr: &Instr) -> Result<[Location; N], Fault> {
        let mut locs = Vec::with_capacity(N);
        for operand in &instr.operands {
            locs.push(self.locate(&operand.spec, operand.kind.size())?);
        }

        <[Location; N]>::try_from(locs).map_err(|_| {
            self.fault(exc::Kind::ReservedOperand { mnemonic: instr.desc.mnemonic })
        })
    }

    fn read(&self, loc: Location, width: Width) -> Result<u64, Fault> {
        match loc {
            Location::Value(value) => Ok(width.truncate(value)),
            Location::Register(reg) => {
                let idx = usize::from(reg);
                let low = u64::from(self.reg.get(idx));
                if width == Width::Quad {
                    Ok(low | u64::from(self.reg.get(idx + 1)) << 32)
                } else {
                    Ok(width.truncate(low))
                }
            }
            Location::Memory(addr) => self
                .mem
                .read_uint(addr, width.size())
                .map_err(|e| self.mem_fault(e)),
        }
    }

    fn write(&mut self, loc: Location, width: Width, value: u64) -> Result<(), Fault> {
        match loc {
            // Only literals are written to; a literal's specifier byte is its value.
            Location::Value(value) => {
                Err(self.fault(exc::Kind::AddressingMode { specifier: value as u8 }))
            }
            Location::Register(reg) => {
                let idx = usize::from(reg);
                match width {
                    Width::Quad => {
                        self.reg.set(idx, value as u32);
                        self.reg.set(idx + 1, (value >> 32) as u32);
                    }
                    Width::Long => self.reg.set(idx, value as u32),
                    // Narrow writes leave the upper bits of the register alone.
                    _ => {
                        let mask = width.mask() as u32;
                        let old = self.reg.get(idx);
                        self.reg.set(idx, (old & !mask) | (value as u32 & mask));
                    }
                }

                Ok(())
            }
            Location::Memory(addr) => self
                .mem
                .write_uint(addr, width.size(), value)
                .map_err(|e| self.mem_fault(e)),
        }
    }

    /// The address of an operand that must live in memory.
    fn address(&self, loc: Location) -> Result<u32, Fault> {
        match loc {
            Location::Memory(addr) => Ok(addr),
            Location::Register(reg) => {
                Err(self.fault(exc::Kind::AddressingMode { specifier: 0x50 | reg }))
            }
            Location::Value(value) => {
                Err(self.fault(exc::Kind::AddressingMode { specifier: value as u8 }))
            }
        }
    }

    fn read_mem_32(&self, addr: u32) -> Result<u32, Fault> {
        self.mem.read_32(addr).map_err(|e| self.mem_fault(e))
    }

    fn write_mem_32(&mut self, addr: u32, value: u32) -> Result<(), Fault> {
        self.mem.write_32(addr, value).map_err(|e| self.mem_fault(e))
    }

    fn push(&mut self, value: u32) -> Result<(), Fault> {
        let sp = self.reg.sp().wrapping_sub(4);
        *self.reg.sp_mut() = sp;

        self.write_mem_32(sp, value)
    }

    fn pop(&mut self) -> Result<u32, Fault> {
        let value = self.read_mem_32(self.reg.sp())?;
        *self.reg.sp_mut() = self.reg.sp().wrapping_add(4);

        Ok(value)
    }

    /// Sets the condition codes from a result, leaving carry alone when `c` is `None`.
    fn set_nz(&mut self, width: Width, result: u64, v: bool, c: Option<bool>) {
        let c = c.unwrap_or(self.reg.flags().c);
        self.reg.set_flags(width.is_negative(result), width.truncate(result) == 0, v, c);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers for running hand-assembled programs.

    use std::{cell::RefCell, io, rc::Rc};

    use vaxrun_aout::{AOut, Header, Symbol, SymbolTable, MAGIC};

    use super::*;

    /// An output sink whose contents remain readable after it is handed to a [`Cpu`].
    #[derive(Clone, Default)]
    pub struct SharedBuf(pub Rc<RefCell<Vec<u8>>>);

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);

            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    /// An executable whose text is `text` and whose entry point is address 0.
    pub fn aout(text: &[u8], symbols: Vec<Symbol>) -> AOut {
        AOut {
            header: Some(Header { magic: MAGIC, text: text.len() as u32, ..Header::default() }),
            text: text.to_vec(),
            data: Vec::new(),
            symbols: SymbolTable::from_symbols(symbols),
        }
    }

    /// A started CPU running `text`, with its output captured.
    pub fn cpu(text: &[u8]) -> (Cpu, SharedBuf) {
        let mut cpu = Cpu::load(&aout(text, vec![]), &["a.out"], &Config::default()).unwrap();
        let out = SharedBuf::default();
        cpu.set_stdout(Box::new(out.clone()));
        cpu.start();

        (cpu, out)
    }

    /// Runs `text` to completion.
    pub fn run(text: &[u8]) -> (Cpu, Result<Halt, Fault>) {
        let (mut cpu, _) = cpu(text);
        let result = cpu.run();

        (cpu, result)
    }

    /// Appends the encoding of `calls $argc, target` to `code`, addressing `target` relative to
    /// the program counter.
    pub fn calls(code: &mut Vec<u8>, argc: u8, target: u32) {
        code.extend([0xfb, argc, 0xef]);
        let next = code.len() as u32 + 4;
        code.extend(target.wrapping_sub(next).to_le_bytes());
    }

    /// Appends `movl $value, rN`.
    pub fn movl_imm(code: &mut Vec<u8>, value: u32, reg: u8) {
        code.extend([0xd0, 0x8f]);
        code.extend(value.to_le_bytes());
        code.push(0x50 | reg);
    }
}
