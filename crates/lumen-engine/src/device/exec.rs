//! Replays a [`CommandList`] into a wgpu command encoder.
//!
//! wgpu tracks resource usage itself, so transitions and UAV barriers only
//! matter to the state validator and are skipped here.

use std::fmt::Display;

use crate::command::{Command, CommandList};
use crate::error::{ErrorCode, GpuError, GpuResult};
use crate::resource::{MeshId, TextureId};

use super::convert;
use super::registry::{GpuPipeline, GpuTexture, Registry};

enum Pass {
    None,
    Render(wgpu::RenderPass<'static>),
    Compute(wgpu::ComputePass<'static>),
}

pub(super) fn record(
    encoder: &mut wgpu::CommandEncoder,
    registry: &Registry,
    surface_view: Option<&wgpu::TextureView>,
    list: &CommandList,
) -> GpuResult<()> {
    let fail = |index: usize, msg: &dyn Display| {
        GpuError::new(ErrorCode::Validation, "execute")
            .with_detail(format!("`{}` #{index}: {msg}", list.label()))
    };

    let mut pass = Pass::None;
    let mut bound_mesh: Option<MeshId> = None;

    for (i, command) in list.commands().iter().enumerate() {
        match command {
            Command::Transition { .. } | Command::UavBarrier { .. } => {}

            Command::BeginRenderPass {
                label,
                color,
                depth,
            } => {
                let color_view = color
                    .map(|c| attachment_view(registry, surface_view, c.texture, c.layer))
                    .transpose()
                    .map_err(|e| fail(i, &e))?;
                let depth_view = depth
                    .map(|d| attachment_view(registry, surface_view, d.texture, d.layer))
                    .transpose()
                    .map_err(|e| fail(i, &e))?;

                let colors: Vec<_> = color
                    .iter()
                    .zip(color_view.iter())
                    .map(|(c, view)| {
                        Some(wgpu::RenderPassColorAttachment {
                            view,
                            depth_slice: None,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: match c.clear {
                                    Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                                        r: r as f64,
                                        g: g as f64,
                                        b: b as f64,
                                        a: a as f64,
                                    }),
                                    None => wgpu::LoadOp::Load,
                                },
                                store: wgpu::StoreOp::Store,
                            },
                        })
                    })
                    .collect();

                let depth_attachment = depth.iter().zip(depth_view.iter()).next().map(|(d, view)| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: d.clear.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                });

                let rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some(*label),
                    color_attachments: &colors,
                    depth_stencil_attachment: depth_attachment,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                    multiview_mask: None,
                });
                pass = Pass::Render(rpass.forget_lifetime());
                bound_mesh = None;
            }

            Command::BeginComputePass { label } => {
                let cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some(*label),
                    timestamp_writes: None,
                });
                pass = Pass::Compute(cpass.forget_lifetime());
            }

            Command::EndRenderPass | Command::EndComputePass => {
                // Dropping the pass ends it.
                pass = Pass::None;
            }

            Command::SetViewport(v) => {
                let Pass::Render(rpass) = &mut pass else {
                    return Err(fail(i, &"viewport outside a render pass"));
                };
                rpass.set_viewport(v.x, v.y, v.width, v.height, v.min_depth, v.max_depth);
            }

            Command::SetScissor(s) => {
                let Pass::Render(rpass) = &mut pass else {
                    return Err(fail(i, &"scissor outside a render pass"));
                };
                rpass.set_scissor_rect(s.x, s.y, s.width, s.height);
            }

            Command::SetPipeline(id) => match (&mut pass, registry.pipelines.get(*id)) {
                (Pass::Render(rpass), Some(GpuPipeline::Render(p))) => rpass.set_pipeline(p),
                (Pass::Compute(cpass), Some(GpuPipeline::Compute(p))) => cpass.set_pipeline(p),
                (_, None) => return Err(fail(i, &format!("unknown {id:?}"))),
                _ => return Err(fail(i, &"pipeline kind does not match the open pass")),
            },

            Command::SetTable {
                group,
                table,
                dynamic_offset,
            } => {
                let Some(bind_group) = registry.tables.get(*table) else {
                    return Err(fail(i, &format!("unknown {table:?}")));
                };
                let offsets: &[u32] = match dynamic_offset {
                    Some(offset) => std::slice::from_ref(offset),
                    None => &[],
                };
                match &mut pass {
                    Pass::Render(rpass) => rpass.set_bind_group(*group, bind_group, offsets),
                    Pass::Compute(cpass) => cpass.set_bind_group(*group, bind_group, offsets),
                    Pass::None => return Err(fail(i, &"table bound outside a pass")),
                }
            }

            Command::DrawIndexed {
                mesh,
                indices,
                base_vertex,
                instances,
            } => {
                let Pass::Render(rpass) = &mut pass else {
                    return Err(fail(i, &"draw outside a render pass"));
                };
                if bound_mesh != Some(*mesh) {
                    let Some(m) = registry.meshes.get(*mesh) else {
                        return Err(fail(i, &format!("unknown {mesh:?}")));
                    };
                    rpass.set_vertex_buffer(0, m.vertices.slice(..));
                    rpass.set_index_buffer(m.indices.slice(..), wgpu::IndexFormat::Uint32);
                    bound_mesh = Some(*mesh);
                }
                rpass.draw_indexed(indices.clone(), *base_vertex, instances.clone());
            }

            Command::Draw {
                vertices,
                instances,
            } => {
                let Pass::Render(rpass) = &mut pass else {
                    return Err(fail(i, &"draw outside a render pass"));
                };
                rpass.draw(vertices.clone(), instances.clone());
            }

            Command::Dispatch { x, y, z } => {
                let Pass::Compute(cpass) = &mut pass else {
                    return Err(fail(i, &"dispatch outside a compute pass"));
                };
                cpass.dispatch_workgroups(*x, *y, *z);
            }
        }
    }

    if !matches!(pass, Pass::None) {
        return Err(fail(list.commands().len(), &"list ends inside a pass"));
    }
    Ok(())
}

fn attachment_view(
    registry: &Registry,
    surface_view: Option<&wgpu::TextureView>,
    id: TextureId,
    layer: u32,
) -> Result<wgpu::TextureView, String> {
    match registry.textures.get(id) {
        Some(GpuTexture::Owned { texture, .. }) => Ok(convert::subresource_view(texture, 0, layer)),
        Some(GpuTexture::BackBuffer) => surface_view
            .cloned()
            .ok_or_else(|| "no back buffer acquired".to_string()),
        None => Err(format!("unknown {id:?}")),
    }
}
