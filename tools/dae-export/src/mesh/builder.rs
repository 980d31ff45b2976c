//! Per-corner vertex unification
//!
//! Each attribute in the source carries its own index stream, so there is no
//! shared vertex key to deduplicate on. Every corner of every triangle gets
//! its own interleaved record.

use super::{AttributeSlot, Extents, IndexBuffer, Mesh, SlotStreams};
use crate::coords::CoordinateSpace;
use crate::error::ConvertError;
use crate::skin::SkinBinding;
use crate::source::{InputBinding, MeshSources, PrimitiveBlock, PrimitiveKind, SourceRef};

/// Builds [`Mesh`]es from the primitive blocks of one `<mesh>`
pub struct MeshBuilder<'a> {
    sources: &'a MeshSources,
    skin: Option<&'a SkinBinding>,
    space: &'a dyn CoordinateSpace,
}

/// Slot streams plus running bounds for the block being built
struct Accumulator<'s> {
    space: &'s dyn CoordinateSpace,
    streams: SlotStreams,
    extents: Option<Extents>,
}

impl Accumulator<'_> {
    fn write(&mut self, slot: AttributeSlot, record: [f32; 4]) {
        let record = self.space.correct_record(slot, record);
        if slot == AttributeSlot::Position {
            Extents::include(&mut self.extents, [record[0], record[1], record[2]]);
        }
        self.streams.push(slot, record);
    }
}

impl<'a> MeshBuilder<'a> {
    pub fn new(
        sources: &'a MeshSources,
        skin: Option<&'a SkinBinding>,
        space: &'a dyn CoordinateSpace,
    ) -> Self {
        Self { sources, skin, space }
    }

    pub fn build(&self, block: &PrimitiveBlock) -> Result<Mesh, ConvertError> {
        check_triangulated(block)?;

        let mut acc = Accumulator {
            space: self.space,
            streams: SlotStreams::new(),
            extents: None,
        };

        let index_stride = block.index_stride();
        if index_stride > 0 {
            for p in (0..block.indices.len()).step_by(index_stride) {
                for input in &block.inputs {
                    let raw = block.indices.get(p + input.offset).ok_or_else(|| {
                        ConvertError::MalformedIndexStream(format!(
                            "corner at {} needs index {} but the stream has {}",
                            p,
                            p + input.offset,
                            block.indices.len()
                        ))
                    })?;
                    self.write_input(&mut acc, input, *raw as usize)?;
                }
            }
        }

        let Accumulator { mut streams, extents, .. } = acc;
        let vertex_count = streams.len(AttributeSlot::Position);
        if vertex_count == 0 && AttributeSlot::ALL.iter().any(|s| !streams.is_empty(*s)) {
            return Err(ConvertError::MissingPositions);
        }
        if vertex_count % 3 != 0 {
            return Err(ConvertError::MalformedIndexStream(format!(
                "{} corners do not form whole triangles",
                vertex_count
            )));
        }

        let layout = validate_streams(&mut streams, vertex_count);
        let (vertex_buffer, record_width) = interleave(&streams, &layout, vertex_count);

        let index_buffer = IndexBuffer::rewound(vertex_count);
        tracing::debug!(
            "Built mesh '{}': {} vertices, {} floats per vertex, {:?} indices",
            block.material.as_deref().unwrap_or("none"),
            vertex_count,
            record_width,
            index_buffer.format
        );

        Ok(Mesh {
            material: block.material.clone(),
            positions: streams.take(AttributeSlot::Position),
            vertex_buffer,
            record_width,
            index_buffer,
            extents: extents.unwrap_or_default(),
            collision_vertices: Vec::new(),
            skinned: self.skin.is_some(),
        })
    }

    fn write_input(
        &self,
        acc: &mut Accumulator<'_>,
        input: &InputBinding,
        position: usize,
    ) -> Result<(), ConvertError> {
        match self.sources.resolve(&input.source)? {
            SourceRef::Float(source) => {
                let slot = AttributeSlot::from_semantic(&input.semantic, input.set)?;
                acc.write(slot, source.record(position)?);
            }
            SourceRef::Vertices(declaration) => {
                for inner in &declaration.inputs {
                    let source = self.sources.float_source(&inner.source)?;
                    let set = inner.set.or(input.set);
                    let slot = AttributeSlot::from_semantic(&inner.semantic, set)?;
                    acc.write(slot, source.record(position)?);
                }
                if let Some(skin) = self.skin {
                    let (Some(indices), Some(weights)) =
                        (skin.blend_indices.get(position), skin.blend_weights.get(position))
                    else {
                        return Err(ConvertError::SourceIndexOutOfRange {
                            source_id: "skin influences".to_string(),
                            index: position,
                            records: skin.vertex_count(),
                        });
                    };
                    acc.write(AttributeSlot::BlendIndices, *indices);
                    acc.write(AttributeSlot::BlendWeights, *weights);
                }
            }
        }
        Ok(())
    }
}

fn check_triangulated(block: &PrimitiveBlock) -> Result<(), ConvertError> {
    if block.kind != PrimitiveKind::Polylist {
        return Ok(());
    }
    match block.vcount.iter().position(|&n| n != 3) {
        Some(polygon) => Err(ConvertError::NonTriangulatedPolygon {
            polygon,
            vertices: block.vcount[polygon],
        }),
        None => Ok(()),
    }
}

/// Effective read stride per slot; 0 means the slot is not interleaved
struct StreamLayout {
    strides: [usize; AttributeSlot::COUNT],
}

impl StreamLayout {
    fn stride(&self, slot: AttributeSlot) -> usize {
        self.strides[slot.index()]
    }
}

/// Check every slot against the corner count, then zero-fill required slots
/// that received no records
///
/// A slot whose length is neither the corner count nor a multiple of it keeps
/// its records but is left out of the interleaved layout.
fn validate_streams(streams: &mut SlotStreams, vertex_count: usize) -> StreamLayout {
    let mut strides = [0; AttributeSlot::COUNT];

    for slot in AttributeSlot::ALL {
        let len = streams.len(slot);
        if len == 0 {
            continue;
        }
        if len == vertex_count {
            strides[slot.index()] = 1;
        } else if len % vertex_count == 0 {
            tracing::warn!(
                "Mismatched vertex stream length for {:?}: {} records for {} vertices, \
                 reading every {}th",
                slot,
                len,
                vertex_count,
                len / vertex_count
            );
            strides[slot.index()] = len / vertex_count;
        } else {
            tracing::warn!(
                "Mismatched vertex stream length for {:?}: {} records for {} vertices, omitted",
                slot,
                len,
                vertex_count
            );
        }
    }

    for slot in AttributeSlot::ALL {
        if slot.is_required() && streams.is_empty(slot) {
            streams.zero_fill(slot, vertex_count);
            strides[slot.index()] = 1;
        }
    }

    StreamLayout { strides }
}

/// Interleave the slot streams, returning the buffer and floats per record
///
/// Both texcoord sets share one group (2 + 2) whenever both are laid out,
/// which includes a zero-filled second set.
fn interleave(
    streams: &SlotStreams,
    layout: &StreamLayout,
    vertex_count: usize,
) -> (Vec<f32>, usize) {
    use AttributeSlot::*;

    let stride = |slot: AttributeSlot| layout.stride(slot);
    let pack_texcoords = stride(TexCoord0) > 0 && stride(TexCoord1) > 0;

    let groups: Vec<AttributeSlot> = [
        Position,
        Normal,
        TexCoord0,
        Tangent,
        Binormal,
        BlendIndices,
        BlendWeights,
    ]
    .into_iter()
    .filter(|slot| stride(*slot) > 0)
    .collect();
    let record_width = groups.len() * 4;

    let mut buffer = Vec::with_capacity(vertex_count * record_width);
    for corner in 0..vertex_count {
        for &slot in &groups {
            let record = streams.get(slot)[corner * stride(slot)];
            if slot == TexCoord0 && pack_texcoords {
                let second = streams.get(TexCoord1)[corner * stride(TexCoord1)];
                buffer.extend_from_slice(&[record[0], record[1], second[0], second[1]]);
            } else {
                buffer.extend_from_slice(&record);
            }
        }
    }

    (buffer, record_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{NativeSpace, ZUpSpace};
    use crate::source::{FloatSource, VertexDeclaration};
    use mesh_common::IndexFormat;

    fn sources() -> MeshSources {
        let mut sources = MeshSources::default();
        sources.add_source(
            FloatSource::new("pos", 3, vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, -1.0, 0.5, 4.0]).unwrap(),
        );
        sources.add_source(FloatSource::new("norm", 3, vec![0.0, 0.0, 1.0]).unwrap());
        sources.add_source(FloatSource::new("uv0", 2, vec![0.25, 0.75, 0.5, 0.5]).unwrap());
        sources.add_source(FloatSource::new("uv1", 2, vec![0.1, 0.2]).unwrap());
        sources.vertices.push(VertexDeclaration {
            id: "verts".to_string(),
            inputs: vec![InputBinding::new("POSITION", "#pos", 0)],
        });
        sources
    }

    fn triangles(inputs: Vec<InputBinding>, indices: Vec<u32>) -> PrimitiveBlock {
        PrimitiveBlock {
            kind: PrimitiveKind::Triangles,
            material: Some("stone".to_string()),
            count: 1,
            inputs,
            indices,
            vcount: Vec::new(),
        }
    }

    fn skin() -> SkinBinding {
        SkinBinding {
            bind_shape_matrix: mesh_common::IDENTITY_MATRIX,
            joint_names: vec!["root".to_string(), "arm".to_string()],
            joint_bind_matrices: mesh_common::IDENTITY_MATRIX.repeat(2),
            blend_indices: vec![[0.0; 4], [1.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]],
            blend_weights: vec![[1.0, 0.0, 0.0, 0.0], [0.6, 0.4, 0.0, 0.0], [0.9, 0.1, 0.0, 0.0]],
            over_budget_vertices: 0,
        }
    }

    #[test]
    fn test_position_only_zero_fills_required_slots() {
        let sources = sources();
        let builder = MeshBuilder::new(&sources, None, &NativeSpace);
        let mesh = builder
            .build(&triangles(vec![InputBinding::new("VERTEX", "#verts", 0)], vec![0, 1, 2]))
            .unwrap();

        assert_eq!(mesh.vertex_count(), 3);
        // position, normal, texcoord, tangent, binormal
        assert_eq!(mesh.record_width, 20);
        assert_eq!(mesh.vertex_buffer.len(), 60);
        assert_eq!(mesh.record(1)[..4], [1.0, 2.0, 3.0, 1.0]);
        assert!(mesh.record(1)[4..].iter().all(|f| *f == 0.0));
        assert_eq!(mesh.index_buffer.indices, vec![2, 1, 0]);
        assert_eq!(mesh.index_buffer.format, IndexFormat::U16);
        assert_eq!(mesh.extents.min, [-1.0, 0.0, 0.0]);
        assert_eq!(mesh.extents.max, [1.0, 2.0, 4.0]);
        assert!(!mesh.skinned);
    }

    #[test]
    fn test_corners_are_not_shared() {
        let sources = sources();
        let builder = MeshBuilder::new(&sources, None, &NativeSpace);
        let mesh = builder
            .build(&triangles(
                vec![InputBinding::new("VERTEX", "#verts", 0)],
                vec![0, 1, 2, 2, 1, 0],
            ))
            .unwrap();

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.record(2), mesh.record(3));
        assert_eq!(mesh.index_buffer.indices, vec![2, 1, 0, 5, 4, 3]);
    }

    #[test]
    fn test_independent_index_streams() {
        let sources = sources();
        let builder = MeshBuilder::new(&sources, None, &NativeSpace);
        let block = triangles(
            vec![
                InputBinding::new("VERTEX", "#verts", 0),
                InputBinding::new("NORMAL", "#norm", 1),
                InputBinding::new("TEXCOORD", "#uv0", 2).with_set(0),
            ],
            vec![0, 0, 1, 1, 0, 0, 2, 0, 1],
        );
        let mesh = builder.build(&block).unwrap();

        assert_eq!(mesh.record(0)[4..8], [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(mesh.record(0)[8..12], [0.5, 0.5, 0.0, 0.0]);
        assert_eq!(mesh.record(1)[8..12], [0.25, 0.75, 0.0, 0.0]);
    }

    #[test]
    fn test_two_texcoord_sets_are_packed() {
        let sources = sources();
        let builder = MeshBuilder::new(&sources, None, &NativeSpace);
        let block = triangles(
            vec![
                InputBinding::new("VERTEX", "#verts", 0),
                InputBinding::new("TEXCOORD", "#uv0", 1).with_set(0),
                InputBinding::new("TEXCOORD", "#uv1", 2).with_set(1),
            ],
            vec![0, 0, 0, 1, 1, 0, 2, 0, 0],
        );
        let mesh = builder.build(&block).unwrap();

        assert_eq!(mesh.record_width, 20);
        assert_eq!(mesh.record(1)[8..12], [0.5, 0.5, 0.1, 0.2]);
    }

    #[test]
    fn test_zup_correction_on_geometric_slots_only() {
        let sources = sources();
        let builder = MeshBuilder::new(&sources, None, &ZUpSpace);
        let block = triangles(
            vec![
                InputBinding::new("VERTEX", "#verts", 0),
                InputBinding::new("NORMAL", "#norm", 1),
                InputBinding::new("TEXCOORD", "#uv0", 1),
            ],
            vec![0, 0, 1, 0, 2, 0],
        );
        let mesh = builder.build(&block).unwrap();

        assert_eq!(mesh.positions[1], [1.0, 3.0, -2.0, 1.0]);
        assert_eq!(mesh.record(0)[4..8], [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(mesh.record(0)[8..12], [0.25, 0.75, 0.0, 0.0]);
        assert_eq!(mesh.extents.min, [-1.0, 0.0, -2.0]);
        assert_eq!(mesh.extents.max, [1.0, 4.0, 0.0]);
    }

    #[test]
    fn test_skin_records_follow_vertex_position() {
        let sources = sources();
        let skin = skin();
        let builder = MeshBuilder::new(&sources, Some(&skin), &ZUpSpace);
        let mesh = builder
            .build(&triangles(vec![InputBinding::new("VERTEX", "#verts", 0)], vec![2, 1, 0]))
            .unwrap();

        assert!(mesh.skinned);
        assert_eq!(mesh.record_width, 28);
        assert_eq!(mesh.record(0)[20..24], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(mesh.record(0)[24..28], [0.9, 0.1, 0.0, 0.0]);
        assert_eq!(mesh.record(2)[24..28], [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_skin_shorter_than_positions() {
        let sources = sources();
        let mut skin = skin();
        skin.blend_indices.truncate(2);
        skin.blend_weights.truncate(2);
        let builder = MeshBuilder::new(&sources, Some(&skin), &NativeSpace);
        let err = builder
            .build(&triangles(vec![InputBinding::new("VERTEX", "#verts", 0)], vec![0, 1, 2]))
            .unwrap_err();
        assert!(matches!(err, ConvertError::SourceIndexOutOfRange { index: 2, .. }));
    }

    #[test]
    fn test_stream_errors() {
        let sources = sources();
        let builder = MeshBuilder::new(&sources, None, &NativeSpace);

        let short = triangles(
            vec![
                InputBinding::new("VERTEX", "#verts", 0),
                InputBinding::new("NORMAL", "#norm", 1),
            ],
            vec![0, 0, 1, 0, 2],
        );
        assert!(matches!(builder.build(&short), Err(ConvertError::MalformedIndexStream(_))));

        let partial = triangles(vec![InputBinding::new("VERTEX", "#verts", 0)], vec![0, 1]);
        assert!(matches!(builder.build(&partial), Err(ConvertError::MalformedIndexStream(_))));

        let unknown = triangles(vec![InputBinding::new("COLOR", "#norm", 0)], vec![0, 0, 0]);
        assert!(matches!(
            builder.build(&unknown),
            Err(ConvertError::UnsupportedSemantic { .. })
        ));

        let dangling = triangles(vec![InputBinding::new("VERTEX", "#nothing", 0)], vec![0, 1, 2]);
        assert_eq!(
            builder.build(&dangling).unwrap_err(),
            ConvertError::UnresolvedSource("nothing".to_string())
        );

        let out_of_range = triangles(vec![InputBinding::new("VERTEX", "#verts", 0)], vec![0, 1, 9]);
        assert!(matches!(
            builder.build(&out_of_range),
            Err(ConvertError::SourceIndexOutOfRange { .. })
        ));

        let no_positions = triangles(vec![InputBinding::new("NORMAL", "#norm", 0)], vec![0, 0, 0]);
        assert_eq!(builder.build(&no_positions).unwrap_err(), ConvertError::MissingPositions);
    }

    #[test]
    fn test_polylist_must_be_triangulated() {
        let sources = sources();
        let builder = MeshBuilder::new(&sources, None, &NativeSpace);
        let mut block = triangles(vec![InputBinding::new("VERTEX", "#verts", 0)], vec![0, 1, 2, 0]);
        block.kind = PrimitiveKind::Polylist;
        block.vcount = vec![4];
        assert_eq!(
            builder.build(&block).unwrap_err(),
            ConvertError::NonTriangulatedPolygon {
                polygon: 0,
                vertices: 4
            }
        );

        block.indices.truncate(3);
        block.vcount = vec![3];
        assert_eq!(builder.build(&block).unwrap().vertex_count(), 3);
    }

    #[test]
    fn test_empty_block() {
        let sources = sources();
        let builder = MeshBuilder::new(&sources, None, &NativeSpace);
        let mesh = builder.build(&triangles(Vec::new(), Vec::new())).unwrap();
        assert_eq!(mesh.vertex_count(), 0);
        assert!(mesh.vertex_buffer.is_empty());
        assert!(mesh.index_buffer.is_empty());
        assert_eq!(mesh.extents, Extents::default());
    }

    #[test]
    fn test_multiple_length_stream_uses_effective_stride() {
        let mut streams = SlotStreams::new();
        for i in 0..3 {
            streams.push(AttributeSlot::Position, [i as f32, 0.0, 0.0, 1.0]);
        }
        for i in 0..6 {
            streams.push(AttributeSlot::Normal, [0.0, i as f32, 0.0, 1.0]);
        }
        streams.push(AttributeSlot::Tangent, [1.0, 0.0, 0.0, 1.0]);

        let layout = validate_streams(&mut streams, 3);
        assert_eq!(layout.stride(AttributeSlot::Normal), 2);
        assert_eq!(layout.stride(AttributeSlot::Binormal), 1);

        let (buffer, width) = interleave(&streams, &layout, 3);
        assert_eq!(buffer[width + 4..width + 8], [0.0, 2.0, 0.0, 1.0]);
        assert_eq!(buffer.len(), 3 * width);
    }

    #[test]
    fn test_mismatched_required_slot_is_omitted() {
        let mut streams = SlotStreams::new();
        for i in 0..3 {
            streams.push(AttributeSlot::Position, [i as f32, 0.0, 0.0, 1.0]);
        }
        streams.push(AttributeSlot::Tangent, [1.0, 0.0, 0.0, 1.0]);

        let layout = validate_streams(&mut streams, 3);
        assert_eq!(layout.stride(AttributeSlot::Tangent), 0);
        assert_eq!(streams.len(AttributeSlot::Tangent), 1);

        // position, normal, texcoords, binormal
        let (buffer, width) = interleave(&streams, &layout, 3);
        assert_eq!(width, 16);
        assert_eq!(buffer.len(), 48);
        assert!(buffer[width + 4..2 * width].iter().all(|f| *f == 0.0));
    }

    #[test]
    fn test_single_texcoord_set_packs_with_zero_fill() {
        let mut sources = MeshSources::default();
        sources.add_source(FloatSource::new("p", 3, vec![0.0; 9]).unwrap());
        sources.add_source(FloatSource::new("t", 2, vec![0.25, 0.75]).unwrap());
        let builder = MeshBuilder::new(&sources, None, &NativeSpace);
        let block = triangles(
            vec![
                InputBinding::new("POSITION", "#p", 0),
                InputBinding::new("TEXCOORD", "#t", 1).with_set(0),
            ],
            vec![0, 0, 1, 0, 2, 0],
        );
        let mesh = builder.build(&block).unwrap();

        assert_eq!(mesh.record_width, 20);
        assert_eq!(mesh.record(0)[8..12], [0.25, 0.75, 0.0, 0.0]);
    }
}
