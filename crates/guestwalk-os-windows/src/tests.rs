use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

use guestwalk_arch_x86::{Cr0, Cr3, PagingMode, Registers, X86};
use guestwalk_core::{
    Architecture as _, Gfn, GuestCore, GuestDriver, GuestError, GuestSession, MappedPage, OsFamily,
    Pa, ProcessId, Va, VcpuId,
};

use super::{EprocessOffsets, KpcrProfile, WindowsOs, WindowsProfile};

const PAGE_SIZE: usize = 0x1000;

const KERNEL_BASE: u64 = 0x0100_0000;
const PROCESS_HEAD: u64 = 0x0050_0000;

const TASKS_OFFSET: u64 = 0x88;
const PID_OFFSET: u64 = 0x84;
const PDBASE_OFFSET: u64 = 0x18;

#[derive(Default)]
struct MockDriver {
    registers: RefCell<Registers>,
    pages: RefCell<HashMap<Gfn, Vec<u8>>>,
    reads: Cell<usize>,
}

impl MockDriver {
    fn set_registers(&self, registers: Registers) {
        *self.registers.borrow_mut() = registers;
    }

    fn write(&self, pa: Pa, data: &[u8]) {
        let gfn = X86::gfn_from_pa(pa);
        let offset = X86::pa_offset(pa) as usize;

        let mut pages = self.pages.borrow_mut();
        let page = pages.entry(gfn).or_insert_with(|| vec![0; PAGE_SIZE]);
        page[offset..offset + data.len()].copy_from_slice(data);
    }

    fn write_u32(&self, pa: Pa, value: u32) {
        self.write(pa, &value.to_le_bytes());
    }

    fn read_count(&self) -> usize {
        self.reads.get()
    }
}

impl GuestDriver for MockDriver {
    type Architecture = X86;

    fn registers(&self, _vcpu: VcpuId) -> Result<Registers, GuestError> {
        Ok(*self.registers.borrow())
    }

    fn read_page(&self, gfn: Gfn) -> Result<MappedPage, GuestError> {
        self.reads.set(self.reads.get() + 1);
        self.pages
            .borrow()
            .get(&gfn)
            .map(|page| MappedPage::new(page.clone()))
            .ok_or(GuestError::Other("page not populated"))
    }
}

/// A driver with CR3 = 0x1000 and a page directory of 1024 present 4 MiB
/// large pages mapping every virtual address to itself, so reads through
/// the guest's paging hit the physical fixture bytes directly.
fn identity_mapped_driver() -> MockDriver {
    let driver = MockDriver::default();
    driver.set_registers(Registers {
        cr0: Cr0(0x8000_0001),
        cr3: Cr3(0x1000),
        ..Default::default()
    });

    for i in 0..1024u64 {
        driver.write_u32(Pa(0x1000 + i * 4), ((i as u32) << 22) | 0x83);
    }

    driver
}

const PROCESSES: [(u64, u32, u32); 3] = [
    (0x0060_0000, 4, 0x0003_9000),
    (0x0060_1000, 123, 0x0003_a000),
    (0x0060_2000, 456, 0x0003_b000),
];

fn populate_process_list(driver: &MockDriver) {
    let links: Vec<u64> = PROCESSES
        .iter()
        .map(|(base, _, _)| base + TASKS_OFFSET)
        .collect();

    driver.write_u32(Pa(PROCESS_HEAD), links[0] as u32);
    driver.write_u32(Pa(PROCESS_HEAD + 4), links[2] as u32);

    for (i, &link) in links.iter().enumerate() {
        let flink = links.get(i + 1).copied().unwrap_or(PROCESS_HEAD);
        let blink = if i == 0 { PROCESS_HEAD } else { links[i - 1] };
        driver.write_u32(Pa(link), flink as u32);
        driver.write_u32(Pa(link + 4), blink as u32);
    }

    for (base, pid, pdbase) in PROCESSES {
        driver.write_u32(Pa(base + PID_OFFSET), pid);
        driver.write_u32(Pa(base + PDBASE_OFFSET), pdbase);
    }
}

fn profile() -> WindowsProfile {
    WindowsProfile {
        kernel_base: Va(KERNEL_BASE),
        process_head: Va(PROCESS_HEAD),
        offsets: EprocessOffsets {
            tasks: TASKS_OFFSET,
            pid: PID_OFFSET,
            pdbase: PDBASE_OFFSET,
        },
        kpcr: None,
    }
}

fn fixture() -> (GuestCore<MockDriver>, WindowsOs<MockDriver>) {
    let driver = identity_mapped_driver();
    populate_process_list(&driver);

    let core = GuestCore::new(driver, PagingMode::Legacy, OsFamily::Windows);
    let os = WindowsOs::new(profile());

    (core, os)
}

/// Builds a minimal PE32 image with a single export
/// (`PsInitialSystemProcess` at RVA 0x3456) and writes it at the kernel
/// base.
fn populate_kernel_image(driver: &MockDriver) {
    let mut image = vec![0u8; PAGE_SIZE];

    let put = |image: &mut Vec<u8>, offset: usize, bytes: &[u8]| {
        image[offset..offset + bytes.len()].copy_from_slice(bytes);
    };
    let put_u16 =
        |image: &mut Vec<u8>, offset: usize, value: u16| put(image, offset, &value.to_le_bytes());
    let put_u32 =
        |image: &mut Vec<u8>, offset: usize, value: u32| put(image, offset, &value.to_le_bytes());

    // DOS header
    put(&mut image, 0x00, b"MZ");
    put_u32(&mut image, 0x3c, 0x80); // e_lfanew

    // NT headers
    put(&mut image, 0x80, b"PE\0\0");
    put_u16(&mut image, 0x84, 0x014c); // machine (i386)
    put_u16(&mut image, 0x94, 0xe0); // size_of_optional_header
    put_u16(&mut image, 0x98, 0x010b); // optional header magic (PE32)
    put_u32(&mut image, 0x98 + 92, 16); // number_of_rva_and_sizes

    // data directory 0: export directory at RVA 0x200, size 0x100
    put_u32(&mut image, 0xf8, 0x200);
    put_u32(&mut image, 0xfc, 0x100);

    // export directory
    put_u32(&mut image, 0x200 + 0x0c, 0x250); // name
    put_u32(&mut image, 0x200 + 0x10, 1); // base ordinal
    put_u32(&mut image, 0x200 + 0x14, 1); // number_of_functions
    put_u32(&mut image, 0x200 + 0x18, 1); // number_of_names
    put_u32(&mut image, 0x200 + 0x1c, 0x228); // address_of_functions
    put_u32(&mut image, 0x200 + 0x20, 0x22c); // address_of_names
    put_u32(&mut image, 0x200 + 0x24, 0x230); // address_of_name_ordinals

    put_u32(&mut image, 0x228, 0x3456); // function RVA
    put_u32(&mut image, 0x22c, 0x234); // name RVA
    put_u16(&mut image, 0x230, 0); // name ordinal index
    put(&mut image, 0x234, b"PsInitialSystemProcess\0");
    put(&mut image, 0x250, b"ntoskrnl.exe\0");

    driver.write(Pa(KERNEL_BASE), &image);
}

#[test]
fn resolves_pid_to_translation_root() {
    let (core, os) = fixture();
    let session = GuestSession::new(&core, &os);

    let root = session.pid_translation_root(ProcessId(123)).unwrap();
    assert_eq!(root, Pa(0x0003_a000));
}

#[test]
fn resolves_translation_root_to_pid() {
    let (core, os) = fixture();
    let session = GuestSession::new(&core, &os);

    let pid = session.pid_by_translation_root(Pa(0x0003_b000)).unwrap();
    assert_eq!(pid, ProcessId(456));
}

#[test]
fn pid_and_root_round_trip() {
    let (core, os) = fixture();
    let session = GuestSession::new(&core, &os);

    for (_, pid, _) in PROCESSES {
        let root = session.pid_translation_root(ProcessId(pid)).unwrap();
        assert_eq!(session.pid_by_translation_root(root).unwrap(), ProcessId(pid));
    }
}

#[test]
fn pid_cache_short_circuits_the_walk() {
    let (core, os) = fixture();
    let session = GuestSession::new(&core, &os);

    let first = session.pid_translation_root(ProcessId(456)).unwrap();
    let reads = core.driver().read_count();

    let second = session.pid_translation_root(ProcessId(456)).unwrap();
    assert_eq!(second, first);
    assert_eq!(core.driver().read_count(), reads);
}

#[test]
fn flushed_cache_entry_walks_again() {
    let (core, os) = fixture();
    let session = GuestSession::new(&core, &os);

    session.pid_translation_root(ProcessId(456)).unwrap();
    core.flush_pid_cache_entry(ProcessId(456));

    let reads = core.driver().read_count();
    session.pid_translation_root(ProcessId(456)).unwrap();
    assert!(core.driver().read_count() > reads);
}

#[test]
fn unknown_pid_is_an_error() {
    let (core, os) = fixture();
    let session = GuestSession::new(&core, &os);

    let err = session.pid_translation_root(ProcessId(999)).unwrap_err();
    assert!(matches!(err, GuestError::Os(_)));
}

#[test]
fn zero_cr3_fails_fast_without_reading() {
    let driver = MockDriver::default();
    driver.set_registers(Registers {
        cr0: Cr0(0x8000_0001),
        cr3: Cr3(0),
        ..Default::default()
    });

    let core = GuestCore::new(driver, PagingMode::Legacy, OsFamily::Windows);
    let os = WindowsOs::new(profile());
    let session = GuestSession::new(&core, &os);

    let err = session.translate_kernel(Va(0x8054_0000)).unwrap_err();
    assert!(matches!(err, GuestError::RootNotPresent));

    let err = session.pid_translation_root(ProcessId(4)).unwrap_err();
    assert!(matches!(err, GuestError::RootNotPresent));

    assert_eq!(core.driver().read_count(), 0);
}

#[test]
fn symbol_from_export_table() {
    let (core, os) = fixture();
    populate_kernel_image(core.driver());

    let session = GuestSession::new(&core, &os);

    let symbol = session.kernel_symbol("PsInitialSystemProcess").unwrap();
    assert_eq!(symbol.address, Va(KERNEL_BASE + 0x3456));
    assert_eq!(symbol.kernel_base, Va(KERNEL_BASE));
}

#[test]
fn symbol_from_debugger_data_short_circuits() {
    const KPCR_BASE: u64 = 0xffdf_f000;
    const VERSION_BLOCK_OFFSET: u64 = 0x34;
    const VERSION_BLOCK: u64 = 0x0070_0000;
    const FIELD_OFFSET: u64 = 0x78;

    let driver = identity_mapped_driver();
    driver.write_u32(Pa(KPCR_BASE + VERSION_BLOCK_OFFSET), VERSION_BLOCK as u32);
    driver.write_u32(Pa(VERSION_BLOCK + FIELD_OFFSET), 0x8054_5678);

    let mut profile = profile();
    profile.kpcr = Some(KpcrProfile {
        base: Va(KPCR_BASE),
        version_block: VERSION_BLOCK_OFFSET,
        debugger_data: [("PsActiveProcessHead".to_string(), FIELD_OFFSET)]
            .into_iter()
            .collect(),
    });

    let core = GuestCore::new(driver, PagingMode::Legacy, OsFamily::Windows);
    let os = WindowsOs::new(profile);
    let session = GuestSession::new(&core, &os);

    // No PE image is populated; reaching the export table would fail, so
    // a successful resolution proves the debugger data won.
    let symbol = session.kernel_symbol("PsActiveProcessHead").unwrap();
    assert_eq!(symbol.address, Va(0x8054_5678));
    assert_eq!(symbol.kernel_base, Va(KERNEL_BASE));
}

#[test]
fn unknown_symbol_is_an_error() {
    let (core, os) = fixture();
    populate_kernel_image(core.driver());

    let session = GuestSession::new(&core, &os);

    let err = session.kernel_symbol("NoSuchExport").unwrap_err();
    assert!(matches!(err, GuestError::Os(_)));
}
