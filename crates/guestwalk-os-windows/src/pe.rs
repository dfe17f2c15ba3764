//! Minimal PE parser for the in-memory kernel image.
//!
//! Only the 32-bit (PE32) shape is understood; the crate targets IA-32
//! guests. The parser operates on the header page read out of the guest and
//! keeps owned copies of the headers, so no borrow ties it to the page
//! buffer.

use object::{
    endian::LittleEndian as LE,
    pe::{
        IMAGE_DIRECTORY_ENTRY_EXPORT, IMAGE_DOS_SIGNATURE, IMAGE_NT_SIGNATURE,
        IMAGE_NUMBEROF_DIRECTORY_ENTRIES, ImageDataDirectory, ImageDosHeader, ImageNtHeaders32,
    },
    read::{
        ReadRef as _,
        pe::{Export, ExportTable, ImageNtHeaders as _, ImageOptionalHeader as _},
    },
};

/// Error types for PE parsing.
#[derive(thiserror::Error, Debug)]
pub enum PeError {
    /// Invalid DOS magic.
    #[error("Invalid DOS magic")]
    InvalidDosMagic,

    /// Invalid DOS header size or alignment.
    #[error("Invalid DOS header size or alignment")]
    InvalidDosHeaderSizeOrAlignment,

    /// Invalid NT headers size or alignment.
    #[error("Invalid NT headers size or alignment")]
    InvalidNtHeadersSizeOrAlignment,

    /// Invalid PE magic.
    #[error("Invalid PE magic")]
    InvalidPeMagic,

    /// Invalid PE optional header magic.
    #[error("Invalid PE optional header magic")]
    InvalidPeOptionalHeaderMagic,

    /// PE optional header size is too small.
    #[error("PE optional header size is too small")]
    PeOptionalHeaderSizeTooSmall,

    /// Invalid PE optional header size.
    #[error("Invalid PE optional header size")]
    InvalidPeOptionalHeaderSize,

    /// Invalid PE number of RVA and sizes.
    #[error("Invalid PE number of RVA and sizes")]
    InvalidPeNumberOfRvaAndSizes,

    /// Invalid export table.
    #[error("Invalid export table")]
    InvalidExportTable,
}

/// A PE32 file parser.
pub struct Pe {
    dos_header: ImageDosHeader,
    nt_headers: ImageNtHeaders32,
    data_directories: [ImageDataDirectory; IMAGE_NUMBEROF_DIRECTORY_ENTRIES],
}

impl Pe {
    /// Data directories larger than this are considered corrupted.
    const MAX_DATA_DIRECTORY_SIZE: u32 = 1024 * 1024; // 1MB

    /// Parses the PE headers from the first page of an image.
    pub fn new(data: &[u8]) -> Result<Self, PeError> {
        let dos_header = *data
            .read_at::<ImageDosHeader>(0)
            .map_err(|_| PeError::InvalidDosHeaderSizeOrAlignment)?;

        if dos_header.e_magic.get(LE) != IMAGE_DOS_SIGNATURE {
            return Err(PeError::InvalidDosMagic);
        }

        let mut offset = dos_header.nt_headers_offset() as u64;
        let nt_headers = *data
            .read::<ImageNtHeaders32>(&mut offset)
            .map_err(|_| PeError::InvalidNtHeadersSizeOrAlignment)?;

        if nt_headers.signature() != IMAGE_NT_SIGNATURE {
            return Err(PeError::InvalidPeMagic);
        }

        if !nt_headers.is_valid_optional_magic() {
            return Err(PeError::InvalidPeOptionalHeaderMagic);
        }

        // Read the rest of the optional header, and then read
        // the data directories from that.
        let optional_data_size =
            u64::from(nt_headers.file_header.size_of_optional_header.get(LE))
                .checked_sub(size_of_val(&nt_headers.optional_header) as u64)
                .ok_or(PeError::PeOptionalHeaderSizeTooSmall)?;

        let optional_data = data
            .read_bytes(&mut offset, optional_data_size)
            .map_err(|_| PeError::InvalidPeOptionalHeaderSize)?;

        let data_directories = optional_data
            .read_slice_at::<ImageDataDirectory>(
                0,
                nt_headers.optional_header.number_of_rva_and_sizes() as usize,
            )
            .map_err(|_| PeError::InvalidPeNumberOfRvaAndSizes)?;

        Ok(Self {
            dos_header,
            nt_headers,
            data_directories: std::array::from_fn(|i| {
                data_directories
                    .get(i)
                    .copied()
                    .unwrap_or(ImageDataDirectory {
                        virtual_address: Default::default(),
                        size: Default::default(),
                    })
            }),
        })
    }

    /// Returns the DOS header.
    pub fn dos_header(&self) -> &ImageDosHeader {
        &self.dos_header
    }

    /// Returns the NT headers.
    pub fn nt_headers(&self) -> &ImageNtHeaders32 {
        &self.nt_headers
    }

    /// Returns the export data-directory entry, if the image has a sane one.
    pub fn export_directory_entry(&self) -> Option<ImageDataDirectory> {
        let entry = self
            .data_directories
            .get(IMAGE_DIRECTORY_ENTRY_EXPORT)
            .copied()?;

        if entry.virtual_address.get(LE) == 0
            || entry.size.get(LE) == 0
            || entry.size.get(LE) > Self::MAX_DATA_DIRECTORY_SIZE
        {
            return None;
        }

        Some(entry)
    }
}

/// Parses the exported symbols out of an export directory blob.
///
/// `data` is the raw content of the export data directory; `entry` is the
/// directory entry it was read from (the RVAs inside the blob are relative
/// to the image base, so the parser needs the directory's own RVA).
pub fn parse_exports<'data>(
    data: &'data [u8],
    entry: &ImageDataDirectory,
) -> Result<Vec<Export<'data>>, PeError> {
    let export_table = ExportTable::parse(data, entry.virtual_address.get(LE))
        .map_err(|_| PeError::InvalidExportTable)?;

    export_table
        .exports()
        .map_err(|_| PeError::InvalidExportTable)
}
