//! Component B: the closed filter taxonomy. One variant per filter ID from
//! spec.md Sec 4.B, each already carrying its resolved argument (string,
//! regex pattern, network descriptor, or inline integer) so that
//! pretty-printing is a pure `Display` impl with no further blob access.
//! Grounded on `examples/original_source/sb2dot/filters.py`, which is
//! authoritative for the exact display strings (the distilled spec's
//! table gives the shape, filters.py gives the literal text).

use std::fmt;

use crate::cursor::Cursor;
use crate::error::DecodeError;
use crate::profile::RegexSlot;

/// A resolved network descriptor, shared by the `local` and `remote`
/// filters. `get_network` in the original reads 8 bytes but only the
/// first two fields and the port are used -- preserved via `Cursor::
/// read_network_at`.
pub(crate) struct NetworkDescriptor {
    typ: u8,
    addr: u8,
    port: u16,
}

impl fmt::Display for NetworkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let typ = match self.typ {
            0x0b => "udp".to_string(),
            0x07 => "tcp".to_string(),
            _ => "unknown".to_string(),
        };
        let addr = if self.addr == 0 { "*".to_string() } else { "localhost".to_string() };
        let port = if self.port == 0 { "*".to_string() } else { self.port.to_string() };
        write!(f, "{}:{}:{}", typ, addr, port)
    }
}

bitflags::bitflags! {
    /// Terminal modifier bits, spec.md Sec 3 and Sec 8 property 2. Bit 1
    /// (`result & 1`) is the allow/deny discriminant and is not part of
    /// this set; it's handled separately by `Terminal::allow`.
    pub struct Modifiers: u16 {
        const GRANT = 0b0000_0010;
        const REPORT = 0b0000_0100;
        const NO_CALLOUT = 0b0000_1000;
        const NO_SANDBOX = 0b0001_0000;
        const PARTIAL_SYMBOLICATION = 0b0010_0000;
    }
}

/// A terminal verdict: `allow`/`deny` plus zero or more modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminal {
    pub allow: bool,
    pub modifiers: Modifiers,
}

impl Terminal {
    pub fn from_result(result: u16) -> Terminal {
        Terminal {
            allow: result & 1 == 0,
            modifiers: Modifiers::from_bits_truncate(result),
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.allow { "allow" } else { "deny" })?;

        let mut names = Vec::new();
        if self.modifiers.contains(Modifiers::GRANT) {
            names.push("grant");
        }
        if self.modifiers.contains(Modifiers::REPORT) {
            names.push("report");
        }
        if self.modifiers.contains(Modifiers::NO_CALLOUT) {
            names.push("no-callout");
        }
        if self.modifiers.contains(Modifiers::NO_SANDBOX) {
            names.push("no-sandbox");
        }
        if self.modifiers.contains(Modifiers::PARTIAL_SYMBOLICATION) {
            names.push("partial-symbolication");
        }
        if !names.is_empty() {
            write!(f, " (with {})", names.join(" "))?;
        }
        Ok(())
    }
}

/// The closed filter taxonomy. Unknown IDs lower to `Generic`.
pub enum Filter {
    Literal(String),
    Regex(String),
    MountRelativePath(String),
    MountRelativeRegex(String),
    Xattr(u16),
    FileMode(u16),
    IpcPosixName(String),
    IpcPosixNameRegex(String),
    GlobalName(String),
    GlobalNameRegex(String),
    LocalName(String),
    LocalNameRegex(String),
    Local(NetworkDescriptor),
    Remote(NetworkDescriptor),
    ControlName(String),
    SocketDomain(u16),
    SocketType(u16),
    SocketProtocol(u16),
    Target(u16),
    FsctlCommand(u16),
    IoctlCommand(u16),
    IokitUserClientClass(String),
    IokitUserClientClassRegex(String),
    IokitProperty(String),
    IokitPropertyRegex(String),
    IokitConnection(String),
    DeviceMajor(u16),
    DeviceMinor(u16),
    DeviceConformsTo(String),
    Extension(String),
    ExtensionClass(String),
    AppleeventDestination(String),
    DebugMode,
    RightName(String),
    PreferenceDomain(String),
    VnodeType(u16),
    Entitlement(String),
    EntitlementBooleanCompare(u16),
    EntitlementStringCompare(String),
    KextBundleId(String),
    InfoType(String),
    NotificationName(String),
    NotificationPayload,
    SemaphoreOwner(u16),
    SysctlName(String),
    ProcessName(String),
    RootlessBootDevice(u16),
    RootlessFile(u16),
    RootlessDisk(u16),
    RootlessProc(u16),
    PrivilegeId(u16),
    ProcessAttribute(u16),
    Uid(u16),
    NvramVariable(String),
    NvramVariableRegex(String),
    Csr(u16),
    HostSpecialPort(u16),
    Generic(u8, u16),
}

fn lossy(bytes: Vec<u8>) -> String {
    String::from_utf8_lossy(&bytes).into_owned()
}

fn regex_text(regex_table: &[RegexSlot], idx: u16) -> Result<String, DecodeError> {
    let slot = regex_table.get(idx as usize).ok_or(DecodeError::RegexIndexOutOfRange {
        idx,
        len: regex_table.len(),
    })?;
    Ok(slot.to_string())
}

impl Filter {
    /// Decode one filter node's `(filter, filter_arg)` pair into its
    /// pretty-printable form. A direct translation of `get_filter` in
    /// `examples/original_source/sb2dot/filters.py`.
    pub fn decode(
        cursor: &Cursor,
        regex_table: &[RegexSlot],
        filter: u8,
        filter_arg: u16,
    ) -> Result<Filter, DecodeError> {
        use Filter::*;

        Ok(match filter {
            1 => Literal(lossy(cursor.read_string_at(filter_arg)?)),
            0x81 => Regex(regex_text(regex_table, filter_arg)?),
            2 => MountRelativePath(lossy(cursor.read_string_at(filter_arg)?)),
            0x82 => MountRelativeRegex(regex_text(regex_table, filter_arg)?),
            3 => Xattr(filter_arg),
            4 => FileMode(filter_arg),
            5 => IpcPosixName(lossy(cursor.read_string_at(filter_arg)?)),
            0x85 => IpcPosixNameRegex(regex_text(regex_table, filter_arg)?),
            6 => GlobalName(lossy(cursor.read_string_at(filter_arg)?)),
            0x86 => GlobalNameRegex(regex_text(regex_table, filter_arg)?),
            7 => LocalName(lossy(cursor.read_string_at(filter_arg)?)),
            0x87 => LocalNameRegex(regex_text(regex_table, filter_arg)?),
            8 => Local(read_network(cursor, filter_arg)?),
            9 => Remote(read_network(cursor, filter_arg)?),
            10 => ControlName(lossy(cursor.read_string_at(filter_arg)?)),
            11 => SocketDomain(filter_arg),
            12 => SocketType(filter_arg),
            13 => SocketProtocol(filter_arg),
            14 => Target(filter_arg),
            15 => FsctlCommand(filter_arg),
            16 => IoctlCommand(filter_arg),
            17 => IokitUserClientClass(lossy(cursor.read_string_at(filter_arg)?)),
            0x91 => IokitUserClientClassRegex(regex_text(regex_table, filter_arg)?),
            18 => IokitProperty(lossy(cursor.read_string_at(filter_arg)?)),
            0x92 => IokitPropertyRegex(regex_text(regex_table, filter_arg)?),
            19 => IokitConnection(lossy(cursor.read_string_at(filter_arg)?)),
            20 => DeviceMajor(filter_arg),
            21 => DeviceMinor(filter_arg),
            22 => DeviceConformsTo(lossy(cursor.read_string_at(filter_arg)?)),
            23 => Extension(lossy(cursor.read_string_nopadding_at(filter_arg)?)),
            24 => ExtensionClass(lossy(cursor.read_string_at(filter_arg)?)),
            25 => AppleeventDestination(lossy(cursor.read_string_at(filter_arg)?)),
            26 => DebugMode,
            27 => RightName(lossy(cursor.read_string_at(filter_arg)?)),
            28 => PreferenceDomain(lossy(cursor.read_string_at(filter_arg)?)),
            29 => VnodeType(filter_arg),
            30 => Entitlement(lossy(cursor.read_string_nopadding_at(filter_arg)?)),
            31 => EntitlementBooleanCompare(filter_arg),
            32 => EntitlementStringCompare(lossy(cursor.read_string_at(filter_arg)?)),
            33 => KextBundleId(lossy(cursor.read_string_at(filter_arg)?)),
            34 => InfoType(lossy(cursor.read_string_at(filter_arg)?)),
            35 => NotificationName(lossy(cursor.read_string_at(filter_arg)?)),
            36 => NotificationPayload,
            37 => SemaphoreOwner(filter_arg),
            38 => SysctlName(lossy(cursor.read_string_at(filter_arg)?)),
            39 => ProcessName(lossy(cursor.read_string_at(filter_arg)?)),
            40 => RootlessBootDevice(filter_arg),
            41 => RootlessFile(filter_arg),
            42 => RootlessDisk(filter_arg),
            43 => RootlessProc(filter_arg),
            44 => PrivilegeId(filter_arg),
            45 => ProcessAttribute(filter_arg),
            46 => Uid(filter_arg),
            47 => NvramVariable(lossy(cursor.read_string_at(filter_arg)?)),
            0xAF => NvramVariableRegex(regex_text(regex_table, filter_arg)?),
            48 => Csr(filter_arg),
            49 => HostSpecialPort(filter_arg),
            other => Generic(other, filter_arg),
        })
    }
}

fn read_network(cursor: &Cursor, filter_arg: u16) -> Result<NetworkDescriptor, DecodeError> {
    let (typ, addr, port) = cursor.read_network_at(filter_arg)?;
    Ok(NetworkDescriptor { typ, addr, port })
}

fn socket_domain_name(v: u16) -> String {
    const NAMES: &[&str] = &[
        "AF_UNSPEC", "AF_UNIX", "AF_INET", "AF_IMPLINK", "AF_PUP", "AF_CHAOS", "AF_NS", "AF_ISO",
        "AF_ECMA", "AF_DATAKIT", "AF_CCITT", "AF_SNA", "AF_DECnet", "AF_DLI", "AF_LAT", "AF_HYLINK",
        "AF_APPLETALK", "AF_ROUTE", "AF_LINK", "AF_XTP", "AF_COIP", "AF_CNT", "AF_RTIP", "AF_IPX",
        "AF_SIP", "AF_PIP", "AF_BLUE", "AF_NDRV", "AF_ISDN", "AF_KEY", "AF_INET6", "AF_NATM",
        "AF_SYSTEM", "AF_NETBIOS", "AF_PPP", "AF_HDRCMPLT", "AF_RESERVED", "AF_IEEE80211", "AF_UTUN",
        "AF_MULTIPATH",
    ];
    match NAMES.get(v as usize) {
        Some(name) => name.to_string(),
        None => v.to_string(),
    }
}

fn target_name(v: u16) -> String {
    match v {
        0 => "unknown - error ???".to_string(),
        1 => "self".to_string(),
        2 => "pgrp".to_string(),
        3 => "others".to_string(),
        4 => "children".to_string(),
        5 => "same-sandbox".to_string(),
        _ => format!("unknown: {}", v),
    }
}

fn semaphore_owner_name(v: u16) -> String {
    match v {
        0 => "unknown - error ???".to_string(),
        1 => "self".to_string(),
        2 => "pgrp".to_string(),
        3 => "others".to_string(),
        4 => "children".to_string(),
        5 => "same-sandbox".to_string(),
        6 => "initproc".to_string(),
        _ => format!("unknown: {}", v),
    }
}

fn vnode_type_name(v: u16) -> String {
    match v {
        0 => "unknown - error ???".to_string(),
        1 => "REGULAR-FILE".to_string(),
        2 => "DIRECTORY".to_string(),
        3 => "BLOCK-DEVICE".to_string(),
        4 => "CHARACTER-DEVICE".to_string(),
        5 => "SYMLINK".to_string(),
        6 => "SOCKET".to_string(),
        7 => "FIFO".to_string(),
        65535 => "TTY".to_string(),
        _ => format!("unknown: {}", v),
    }
}

fn privilege_id_name(v: u16) -> String {
    match v {
        1000 => "PRIV_ADJTIME".to_string(),
        1001 => "PRIV_PROC_UUID_POLICY".to_string(),
        1002 => "PRIV_GLOBAL_PROC_INFO".to_string(),
        1003 => "PRIV_SYSTEM_OVERRIDE".to_string(),
        1004 => "PRIV_HW_DEBUG_DATA".to_string(),
        1005 => "PRIV_SELECTIVE_FORCED_IDLE".to_string(),
        1006 => "PRIV_PROC_TRACE_INSPECT".to_string(),
        1008 => "PRIV_KERNEL_WORK_INTERNAL".to_string(),
        6000 => "PRIV_VM_PRESSURE".to_string(),
        6001 => "PRIV_VM_JETSAM".to_string(),
        6002 => "PRIV_VM_FOOTPRINT_LIMIT".to_string(),
        10000 => "PRIV_NET_PRIVILEGED_TRAFFIC_CLASS".to_string(),
        10001 => "PRIV_NET_PRIVILEGED_SOCKET_DELEGATE".to_string(),
        10002 => "PRIV_NET_INTERFACE_CONTROL".to_string(),
        10003 => "PRIV_NET_PRIVILEGED_NETWORK_STATISTICS".to_string(),
        10004 => "PRIV_NET_PRIVILEGED_NECP_POLICIES".to_string(),
        10005 => "PRIV_NET_RESTRICTED_AWDL".to_string(),
        10006 => "PRIV_NET_PRIVILEGED_NECP_MATCH".to_string(),
        11000 => "PRIV_NETINET_RESERVEDPORT".to_string(),
        14000 => "PRIV_VFS_OPEN_BY_ID".to_string(),
        _ => v.to_string(),
    }
}

fn process_attribute_name(v: u16) -> String {
    match v {
        0 => "is-plugin".to_string(),
        1 => "is-installer".to_string(),
        2 => "is-restricted".to_string(),
        3 => "is-initproc".to_string(),
        _ => format!("unknown: {}", v),
    }
}

fn csr_name(v: u16) -> String {
    match v {
        1 => "CSR_ALLOW_UNTRUSTED_KEXTS".to_string(),
        2 => "CSR_ALLOW_UNRESTRICTED_FS".to_string(),
        4 => "CSR_ALLOW_TASK_FOR_PID".to_string(),
        8 => "CSR_ALLOW_KERNEL_DEBUGGER".to_string(),
        16 => "CSR_ALLOW_APPLE_INTERNAL".to_string(),
        32 => "CSR_ALLOW_UNRESTRICTED_DTRACE".to_string(),
        64 => "CSR_ALLOW_UNRESTRICTED_NVRAM".to_string(),
        128 => "CSR_ALLOW_DEVICE_CONFIGURATION".to_string(),
        _ => format!("unknown: {}", v),
    }
}

fn host_special_port_name(v: u16) -> String {
    match v {
        8 => "HOST_DYNAMIC_PAGER_PORT".to_string(),
        9 => "HOST_AUDIT_CONTROL_PORT".to_string(),
        10 => "HOST_USER_NOTIFICATION_PORT".to_string(),
        11 => "HOST_AUTOMOUNTD_PORT".to_string(),
        12 => "HOST_LOCKD_PORT".to_string(),
        13 => "unknown: 13".to_string(),
        14 => "HOST_SEATBELT_PORT".to_string(),
        15 => "HOST_KEXTD_PORT".to_string(),
        16 => "HOST_CHUD_PORT".to_string(),
        17 => "HOST_UNFREED_PORT".to_string(),
        18 => "HOST_AMFID_PORT".to_string(),
        19 => "HOST_GSSD_PORT".to_string(),
        20 => "HOST_TELEMETRY_PORT".to_string(),
        21 => "HOST_ATM_NOTIFICATION_PORT".to_string(),
        22 => "HOST_COALITION_PORT".to_string(),
        23 => "HOST_SYSDIAGNOSE_PORT".to_string(),
        24 => "HOST_XPC_EXCEPTION_PORT".to_string(),
        25 => "HOST_CONTAINERD_PORT".to_string(),
        _ => format!("unknown: {}", v),
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Filter::*;
        match self {
            Literal(s) => write!(f, "(literal \"{}\")", s),
            Regex(s) => write!(f, "(regex #\"{}\")", s),
            MountRelativePath(s) => write!(f, "(mount-relative-path \"{}\")", s),
            MountRelativeRegex(s) => write!(f, "(mount-relative-regex #\"{}\")", s),
            Xattr(v) => write!(f, "(xattr {})", v),
            FileMode(v) => write!(f, "(file-mode #o{:04o})", v),
            IpcPosixName(s) => write!(f, "(ipc-posix-name \"{}\")", s),
            IpcPosixNameRegex(s) => write!(f, "(ipc-posix-name-regex #\"{}\")", s),
            GlobalName(s) => write!(f, "(global-name \"{}\")", s),
            GlobalNameRegex(s) => write!(f, "(global-name-regex #\"{}\")", s),
            LocalName(s) => write!(f, "(local-name \"{}\")", s),
            LocalNameRegex(s) => write!(f, "(local-name-regex #\"{}\")", s),
            Local(n) => write!(f, "(local \"{}\")", n),
            Remote(n) => write!(f, "(remote \"{}\")", n),
            ControlName(s) => write!(f, "(control-name \"{}\")", s),
            SocketDomain(v) => write!(f, "(socket-domain {})", socket_domain_name(*v)),
            SocketType(v) => write!(f, "(socket-type {})", v),
            SocketProtocol(v) => {
                let name = if *v == 2 { "SYSPROTO_CONTROL".to_string() } else { v.to_string() };
                write!(f, "(socket-protocol {})", name)
            }
            Target(v) => write!(f, "(target {})", target_name(*v)),
            FsctlCommand(v) => write!(f, "(fsctl-command {:#x})", v),
            IoctlCommand(v) => write!(f, "(ioctl-command {:#x})", v),
            IokitUserClientClass(s) => write!(f, "(iokit-user-client-class \"{}\")", s),
            IokitUserClientClassRegex(s) => write!(f, "(iokit-user-client-class-regex #\"{}\")", s),
            IokitProperty(s) => write!(f, "(iokit-property \"{}\")", s),
            IokitPropertyRegex(s) => write!(f, "(iokit-property-regex #\"{}\")", s),
            IokitConnection(s) => write!(f, "(iokit-connection \"{}\")", s),
            DeviceMajor(v) => write!(f, "(device-major {})", v),
            DeviceMinor(v) => write!(f, "(device-minor {})", v),
            DeviceConformsTo(s) => write!(f, "(device-conforms-to \"{}\")", s),
            Extension(s) => write!(f, "(extension \"{}\")", s),
            ExtensionClass(s) => write!(f, "(extension-class \"{}\")", s),
            AppleeventDestination(s) => write!(f, "(appleevent-destination \"{}\")", s),
            DebugMode => write!(f, "(debug-mode)"),
            RightName(s) => write!(f, "(right-name \"{}\")", s),
            PreferenceDomain(s) => write!(f, "(preference-domain \"{}\")", s),
            VnodeType(v) => write!(f, "(vnode-type {})", vnode_type_name(*v)),
            Entitlement(s) => write!(f, "(entitlement \"{}\")", s),
            EntitlementBooleanCompare(v) => {
                write!(f, "(entitlement-boolean-compare {})", if *v != 0 { "true" } else { "false" })
            }
            EntitlementStringCompare(s) => write!(f, "(entitlement-string-compare \"{}\")", s),
            KextBundleId(s) => write!(f, "(kext-bundle-id \"{}\")", s),
            InfoType(s) => write!(f, "(info-type \"{}\")", s),
            NotificationName(s) => write!(f, "(notification-name \"{}\")", s),
            NotificationPayload => write!(f, "(notification-payload)"),
            SemaphoreOwner(v) => write!(f, "(semaphore-owner {})", semaphore_owner_name(*v)),
            SysctlName(s) => write!(f, "(sysctl-name \"{}\")", s),
            ProcessName(s) => write!(f, "(process-name \"{}\")", s),
            RootlessBootDevice(_) => write!(f, "(rootless-boot-device-filter)"),
            RootlessFile(_) => write!(f, "(rootless-file-filter)"),
            RootlessDisk(_) => write!(f, "(rootless-disk-filter)"),
            RootlessProc(_) => write!(f, "(rootless-proc-filter)"),
            PrivilegeId(v) => write!(f, "(privilege-id {})", privilege_id_name(*v)),
            ProcessAttribute(v) => write!(f, "(process-attribute {})", process_attribute_name(*v)),
            Uid(v) => write!(f, "(uid {})", v),
            NvramVariable(s) => write!(f, "(nvram-variable \"{}\")", s),
            NvramVariableRegex(s) => write!(f, "(nvram-variable-regex \"{}\")", s),
            Csr(v) => write!(f, "(csr {})", csr_name(*v)),
            HostSpecialPort(v) => write!(f, "(host-special-port {})", host_special_port_name(*v)),
            Generic(typ, arg) => write!(f, "(generic-fixme-filter {:#04x} {:#06x})", typ, arg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_bit_mapping_spans_all_64_values() {
        for r in 0u16..64 {
            let t = Terminal::from_result(r);
            assert_eq!(t.allow, r & 1 == 0);
            assert_eq!(t.modifiers.contains(Modifiers::GRANT), r & 2 != 0);
            assert_eq!(t.modifiers.contains(Modifiers::REPORT), r & 4 != 0);
            assert_eq!(t.modifiers.contains(Modifiers::NO_CALLOUT), r & 8 != 0);
            assert_eq!(t.modifiers.contains(Modifiers::NO_SANDBOX), r & 16 != 0);
            assert_eq!(t.modifiers.contains(Modifiers::PARTIAL_SYMBOLICATION), r & 32 != 0);
        }
    }

    #[test]
    fn terminal_with_modifiers_prints_in_fixed_order() {
        let t = Terminal::from_result(0x07); // deny, grant, report
        assert_eq!(t.to_string(), "deny (with grant report)");
    }

    #[test]
    fn literal_filter_prints_quoted_string() {
        assert_eq!(Filter::Literal("hello".to_string()).to_string(), "(literal \"hello\")");
    }

    #[test]
    fn file_mode_prints_four_wide_octal() {
        assert_eq!(Filter::FileMode(0o644).to_string(), "(file-mode #o0644)");
    }

    #[test]
    fn network_filters_render_star_and_localhost() {
        let wildcard = Filter::Local(NetworkDescriptor { typ: 0x07, addr: 0, port: 0 });
        assert_eq!(wildcard.to_string(), "(local \"tcp:*:*\")");

        let bound = Filter::Local(NetworkDescriptor { typ: 0x07, addr: 1, port: 80 });
        assert_eq!(bound.to_string(), "(local \"tcp:localhost:80\")");
    }

    #[test]
    fn unknown_socket_domain_falls_back_to_decimal() {
        assert_eq!(Filter::SocketDomain(9999).to_string(), "(socket-domain 9999)");
    }

    #[test]
    fn unknown_filter_id_lowers_to_generic() {
        let g = Filter::Generic(0x63, 0x1234);
        assert_eq!(g.to_string(), "(generic-fixme-filter 0x63 0x1234)");
    }
}
