// SPDX-License-Identifier: MPL-2.0

//! Names of system calls.

/// System calls of Seventh Edition UNIX, indexed by number.
const SYSCALLS: [&str; 62] = [
    "indir", "exit", "fork", "read", "write", "open", "close", "wait",
    "creat", "link", "unlink", "exec", "chdir", "time", "mknod", "chmod",
    "chown", "break", "stat", "seek", "getpid", "mount", "umount", "setuid",
    "getuid", "stime", "ptrace", "alarm", "fstat", "pause", "utime", "stty",
    "gtty", "access", "nice", "ftime", "sync", "kill", "switch", "setpgrp",
    "tell", "dup", "pipe", "times", "prof", "tiu", "setgid", "getgid",
    "sig", "(reserved)", "(reserved)", "sysacct", "sysphys", "syslock", "ioctl", "reboot",
    "mpxchan", "(reserved)", "(reserved)", "exece", "umask", "chroot",
];

pub fn for_syscall(number: u32) -> &'static str {
    usize::try_from(number)
        .ok()
        .and_then(|it| SYSCALLS.get(it))
        .copied()
        .unwrap_or("???")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_supported_calls() {
        assert_eq!(for_syscall(1), "exit");
        assert_eq!(for_syscall(4), "write");
        assert_eq!(for_syscall(6), "close");
        assert_eq!(for_syscall(54), "ioctl");
        assert_eq!(for_syscall(61), "chroot");
        assert_eq!(for_syscall(62), "???");
    }
}
