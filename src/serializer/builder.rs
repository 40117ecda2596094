use crate::compression::{compress, pick_quality};
use crate::crc::{crc32, model_hash};
use crate::error::{LefError, LefResult};
use crate::format::layer::{LAYER_HEADER_SIZE, LAYER_INDEX_ENTRY_SIZE};
use crate::format::model_meta::{AUTHOR_LEN, DESCRIPTION_LEN, NAME_LEN, VERSION_LEN};
use crate::format::{
    Header, HeaderFlags, LayerHeader, LayerIndexEntry, LayerKind, ModelMeta, QuantizationKind, HEADER_SIZE,
    MODEL_META_SIZE,
};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

struct Architecture {
    input_dim: u32,
    output_dim: u32,
    hidden_dim: u32,
    num_layers: u32,
    num_heads: u32,
    vocab_size: u32,
}

struct AudioConfig {
    sample_rate: u32,
    mel_channels: u32,
    hop_length: u32,
    win_length: u32,
}

/// Fixed offsets once `num_layers` is known: the index table and the header
/// table both have a size that depends only on the layer count, so the
/// whole on-disk layout is resolved as soon as the first layer is added.
struct Layout {
    index_offset: u32,
    header_table_offset: u32,
    layer_data_offset: u32,
}

fn resolve_layout(num_layers: u32) -> Layout {
    let index_offset = (HEADER_SIZE + MODEL_META_SIZE) as u32;
    let header_table_offset = index_offset + num_layers * LAYER_INDEX_ENTRY_SIZE as u32;
    let layer_data_offset = header_table_offset + num_layers * LAYER_HEADER_SIZE as u32;
    Layout {
        index_offset,
        header_table_offset,
        layer_data_offset,
    }
}

fn fits(s: &str, width: usize, field: &str) -> LefResult<()> {
    if s.len() >= width {
        return Err(LefError::InvalidArgument(format!(
            "{field} '{s}' ({} bytes) does not fit in a {width}-byte field",
            s.len()
        )));
    }
    Ok(())
}

/// Builds a LEF file on disk, one layer at a time.
///
/// Rather than seeking back to patch a placeholder header the moment each
/// field becomes known, the builder resolves the whole on-disk [`Layout`]
/// as soon as `num_layers` is known (from [`Self::set_model_architecture`])
/// and keeps writing forward: the index and header tables are zero-padded
/// immediately, payloads are appended as [`Self::add_layer`] is called, and
/// [`Self::finalize`] makes a single pass back to offset 0 to fill in the
/// real header, metadata, index, and header table. This sidesteps any
/// question of where exactly a half-written file's tables live: there is
/// only ever one layout, computed once.
pub struct LefSerializer {
    writer: File,
    header: Header,
    name: Option<String>,
    version: Option<String>,
    author: String,
    description: String,
    architecture: Option<Architecture>,
    audio: Option<AudioConfig>,
    quantization: QuantizationKind,
    mixed_precision: bool,
    compression_level: Option<u8>,
    checksums_enabled: bool,
    layers: Vec<(LayerIndexEntry, LayerHeader)>,
    layout: Option<Layout>,
    cursor: u64,
    seen_layer_ids: HashSet<u16>,
}

impl LefSerializer {
    /// Open `path` for writing, truncating any existing file.
    pub fn open<P: AsRef<Path>>(path: P) -> LefResult<Self> {
        let writer = File::create(path)?;
        Ok(Self {
            writer,
            header: Header::init(),
            name: None,
            version: None,
            author: String::new(),
            description: String::new(),
            architecture: None,
            audio: None,
            quantization: QuantizationKind::None,
            mixed_precision: false,
            compression_level: None,
            checksums_enabled: true,
            layers: Vec::new(),
            layout: None,
            cursor: 0,
            seen_layer_ids: HashSet::new(),
        })
    }

    pub fn set_model_info(
        &mut self,
        name: &str,
        version: &str,
        author: Option<&str>,
        description: Option<&str>,
    ) -> LefResult<()> {
        if name.is_empty() {
            return Err(LefError::InvalidArgument("model name must not be empty".to_string()));
        }
        fits(name, NAME_LEN, "name")?;
        fits(version, VERSION_LEN, "version")?;
        let author = author.unwrap_or("");
        let description = description.unwrap_or("");
        fits(author, AUTHOR_LEN, "author")?;
        fits(description, DESCRIPTION_LEN, "description")?;

        self.name = Some(name.to_string());
        self.version = Some(version.to_string());
        self.author = author.to_string();
        self.description = description.to_string();
        Ok(())
    }

    pub fn set_model_architecture(
        &mut self,
        input_dim: u32,
        output_dim: u32,
        hidden_dim: u32,
        num_layers: u32,
        num_heads: u32,
        vocab_size: u32,
    ) -> LefResult<()> {
        for (label, v) in [
            ("input_dim", input_dim),
            ("output_dim", output_dim),
            ("hidden_dim", hidden_dim),
            ("num_layers", num_layers),
            ("num_heads", num_heads),
            ("vocab_size", vocab_size),
        ] {
            if v == 0 {
                return Err(LefError::InvalidArgument(format!("{label} must be > 0")));
            }
        }
        self.architecture = Some(Architecture {
            input_dim,
            output_dim,
            hidden_dim,
            num_layers,
            num_heads,
            vocab_size,
        });
        Ok(())
    }

    pub fn set_audio_config(
        &mut self,
        sample_rate: u32,
        mel_channels: u32,
        hop_length: u32,
        win_length: u32,
    ) -> LefResult<()> {
        for (label, v) in [
            ("sample_rate", sample_rate),
            ("mel_channels", mel_channels),
            ("hop_length", hop_length),
            ("win_length", win_length),
        ] {
            if v == 0 {
                return Err(LefError::InvalidArgument(format!("{label} must be > 0")));
            }
        }
        if hop_length > win_length {
            return Err(LefError::InvalidArgument("hop_length must be <= win_length".to_string()));
        }
        self.audio = Some(AudioConfig {
            sample_rate,
            mel_channels,
            hop_length,
            win_length,
        });
        Ok(())
    }

    pub fn enable_compression(&mut self, level: u8) -> LefResult<()> {
        if !(1..=9).contains(&level) {
            return Err(LefError::InvalidArgument(format!(
                "compression level {level} out of range 1..=9"
            )));
        }
        self.compression_level = Some(level);
        self.header.flags.set(HeaderFlags::COMPRESSED);
        Ok(())
    }

    pub fn disable_compression(&mut self) {
        self.compression_level = None;
        self.header.flags.clear(HeaderFlags::COMPRESSED);
    }

    /// Opt out of per-layer checksums, setting `CHECKSUM_DISABLED` so readers
    /// on [`crate::config::ChecksumPolicy::TrustWriterFlag`] skip verification
    /// instead of treating every `checksum == 0` as absent.
    pub fn disable_checksums(&mut self) {
        self.checksums_enabled = false;
        self.header.flags.set(HeaderFlags::CHECKSUM_DISABLED);
    }

    pub fn set_default_quantization(&mut self, kind: QuantizationKind) {
        self.quantization = kind;
        if kind != QuantizationKind::None {
            self.header.flags.set(HeaderFlags::QUANTIZED);
        } else {
            self.header.flags.clear(HeaderFlags::QUANTIZED);
        }
    }

    pub fn set_mixed_precision(&mut self, enabled: bool) {
        self.mixed_precision = enabled;
    }

    fn pad_to_layer_data_offset(&mut self, num_layers: u32) -> LefResult<()> {
        let layout = resolve_layout(num_layers);
        let padding = layout.layer_data_offset as u64 - self.cursor;
        self.writer.write_all(&vec![0u8; padding as usize])?;
        self.cursor += padding;
        self.layout = Some(layout);
        Ok(())
    }

    /// Append one layer's payload. `layer_meta`, if given, is written
    /// immediately after the payload and counted in `meta_size`; nothing in
    /// this crate parses it back, it is passed through for callers that
    /// attach their own per-layer sidecar data.
    pub fn add_layer(
        &mut self,
        layer_id: u16,
        layer_kind: LayerKind,
        quantization_type: QuantizationKind,
        weight_data: &[u8],
        layer_meta: Option<&[u8]>,
    ) -> LefResult<()> {
        let architecture = self
            .architecture
            .as_ref()
            .ok_or_else(|| LefError::InvalidArgument("set_model_architecture must be called before add_layer".to_string()))?;
        if weight_data.is_empty() {
            return Err(LefError::InvalidArgument("layer weight_data must not be empty".to_string()));
        }
        if self.seen_layer_ids.contains(&layer_id) {
            return Err(LefError::InvalidArgument(format!("layer id {layer_id} added twice")));
        }
        if self.layers.len() as u32 >= architecture.num_layers {
            return Err(LefError::InvalidArgument(format!(
                "architecture declared {} layers, add_layer called more than that",
                architecture.num_layers
            )));
        }

        if self.layout.is_none() {
            self.pad_to_layer_data_offset(architecture.num_layers)?;
        }
        let layout = self.layout.as_ref().expect("layout resolved above");

        let (stored, compressed_size) = match self.compression_level {
            Some(level) => {
                let quality = pick_quality(layer_kind, quantization_type, level);
                let candidate = compress(weight_data, quality);
                if candidate.len() < weight_data.len() {
                    let len = candidate.len() as u32;
                    (candidate, len)
                } else {
                    (weight_data.to_vec(), 0)
                }
            }
            None => (weight_data.to_vec(), 0),
        };

        let checksum = if self.checksums_enabled { crc32(weight_data) } else { 0 };
        let data_offset = self.cursor as u32;

        self.writer.write_all(&stored)?;
        self.cursor += stored.len() as u64;

        let meta_size = if let Some(meta_bytes) = layer_meta {
            self.writer.write_all(meta_bytes)?;
            self.cursor += meta_bytes.len() as u64;
            meta_bytes.len() as u32
        } else {
            0
        };

        let header_offset = layout.header_table_offset + self.layers.len() as u32 * LAYER_HEADER_SIZE as u32;

        let index_entry = LayerIndexEntry {
            layer_id,
            header_offset,
            data_offset,
            data_size: weight_data.len() as u32,
        };
        let layer_header = LayerHeader {
            layer_id,
            layer_kind,
            quantization_type,
            meta_size,
            data_size: weight_data.len() as u32,
            compressed_size,
            data_offset,
            checksum,
        };
        layer_header.validate()?;

        self.seen_layer_ids.insert(layer_id);
        self.layers.push((index_entry, layer_header));
        Ok(())
    }

    /// Finish the file: write the real header, model metadata, index table,
    /// and header table over the placeholder region, then flush.
    pub fn finalize(mut self) -> LefResult<()> {
        let architecture = self
            .architecture
            .take()
            .ok_or_else(|| LefError::InvalidArgument("set_model_architecture was never called".to_string()))?;
        let audio = self
            .audio
            .take()
            .ok_or_else(|| LefError::InvalidArgument("set_audio_config was never called".to_string()))?;
        let name = self
            .name
            .take()
            .ok_or_else(|| LefError::InvalidArgument("set_model_info was never called".to_string()))?;
        let version = self.version.take().unwrap_or_default();

        if self.layers.len() as u32 != architecture.num_layers {
            return Err(LefError::InvalidArgument(format!(
                "architecture declared {} layers but {} were added",
                architecture.num_layers,
                self.layers.len()
            )));
        }

        let layout = resolve_layout(architecture.num_layers);

        let meta = ModelMeta {
            name,
            version,
            author: self.author.clone(),
            description: self.description.clone(),
            input_dim: architecture.input_dim,
            output_dim: architecture.output_dim,
            hidden_dim: architecture.hidden_dim,
            num_layers: architecture.num_layers,
            num_heads: architecture.num_heads,
            vocab_size: architecture.vocab_size,
            sample_rate: audio.sample_rate,
            mel_channels: audio.mel_channels,
            hop_length: audio.hop_length,
            win_length: audio.win_length,
            default_quantization: self.quantization,
            mixed_precision: self.mixed_precision,
            quantization_params_size: 0,
        };
        meta.validate()?;

        let hash = model_hash(
            &meta.name,
            &meta.version,
            meta.input_dim,
            meta.output_dim,
            meta.hidden_dim,
            meta.num_layers,
            meta.num_heads,
            meta.vocab_size,
            meta.sample_rate,
            meta.mel_channels,
            meta.hop_length,
            meta.win_length,
        );

        self.header.model_hash = hash;
        self.header.layer_index_offset = layout.index_offset;
        self.header.layer_data_offset = layout.layer_data_offset;
        self.header.file_size = self.cursor as u32;
        self.header.timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.header.validate()?;

        self.writer.seek(SeekFrom::Start(0))?;
        self.header.write(&mut self.writer)?;
        meta.write(&mut self.writer)?;
        for (entry, _) in &self.layers {
            entry.write(&mut self.writer)?;
        }
        for (_, layer_header) in &self.layers {
            layer_header.write(&mut self.writer)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
