//! 图形管线：根签名、着色器、PSO、顶点缓冲区和命令列表

use std::ffi::CString;
use std::mem::ManuallyDrop;
use tracing::{debug, info};
use windows::{
    core::*, Win32::Foundation::RECT, Win32::Graphics::Direct3D::Fxc::*,
    Win32::Graphics::Direct3D::*, Win32::Graphics::Direct3D12::*,
    Win32::Graphics::Dxgi::Common::*,
};

use super::display::BACK_BUFFER_FORMAT;
use super::graphics_error;
use crate::core::error::{GraphicsError, Result};
use crate::core::TriangleMode;
use crate::renderer::shaders::{self, ShaderStage};
use crate::renderer::vertex::{triangle_vertices, Vertex};

/// 参数化模式下常量缓冲区所在的根参数槽位
const CONSTANT_BUFFER_ROOT_PARAMETER: u32 = 0;

/// 单次绘制所需的一帧目标
pub struct FrameTarget<'a> {
    pub render_target: &'a ID3D12Resource,
    pub rtv_handle: D3D12_CPU_DESCRIPTOR_HANDLE,
    pub clear_color: [f32; 4],
    /// 参数化模式下绑定到 b0 的常量缓冲区地址
    pub constant_buffer: Option<u64>,
}

pub struct GraphicsPipeline {
    command_list: ID3D12GraphicsCommandList,
    vertex_buffer_view: D3D12_VERTEX_BUFFER_VIEW,
    #[allow(dead_code)]  // 视图引用其 GPU 地址，需保持存活
    vertex_buffer: ID3D12Resource,
    pipeline_state: ID3D12PipelineState,
    root_signature: ID3D12RootSignature,
    viewport: D3D12_VIEWPORT,
    scissor_rect: RECT,
    mode: TriangleMode,
}

impl GraphicsPipeline {
    /// 创建管线
    ///
    /// 静态模式下 `aspect_ratio` 直接写入顶点数据；参数化模式下顶点使用比例 1.0。
    pub fn new(
        device: &ID3D12Device,
        command_allocator: &ID3D12CommandAllocator,
        mode: TriangleMode,
        width: u32,
        height: u32,
        aspect_ratio: f32,
    ) -> Result<Self> {
        unsafe {
            let root_signature = create_root_signature(device, mode)?;

            let vertex_shader = compile_shader(shaders::TRIANGLE_HLSL, shaders::vertex_stage(mode))?;
            let pixel_shader = compile_shader(shaders::TRIANGLE_HLSL, shaders::PIXEL)?;

            let pipeline_state =
                create_pipeline_state(device, &root_signature, &vertex_shader, &pixel_shader)?;

            let baked_ratio = match mode {
                TriangleMode::Static => aspect_ratio,
                TriangleMode::Parameterized => 1.0,
            };
            let vertices = triangle_vertices(baked_ratio);
            let (vertex_buffer, vertex_buffer_view) = create_vertex_buffer(device, &vertices)?;

            let command_list: ID3D12GraphicsCommandList = device
                .CreateCommandList(0, D3D12_COMMAND_LIST_TYPE_DIRECT, command_allocator, &pipeline_state)
                .map_err(graphics_error(GraphicsError::ResourceCreation, "CreateCommandList"))?;

            // 命令列表创建时处于录制状态，首帧会先 Reset
            command_list
                .Close()
                .map_err(graphics_error(GraphicsError::CommandExecution, "Close"))?;

            let viewport = D3D12_VIEWPORT {
                TopLeftX: 0.0,
                TopLeftY: 0.0,
                Width: width as f32,
                Height: height as f32,
                MinDepth: D3D12_MIN_DEPTH,
                MaxDepth: D3D12_MAX_DEPTH,
            };

            let scissor_rect = RECT {
                left: 0,
                top: 0,
                right: width as i32,
                bottom: height as i32,
            };

            info!(mode = mode.name(), "Graphics pipeline created");

            Ok(Self {
                command_list,
                vertex_buffer_view,
                vertex_buffer,
                pipeline_state,
                root_signature,
                viewport,
                scissor_rect,
                mode,
            })
        }
    }

    /// 录制一帧的命令
    ///
    /// 调用者必须保证分配器上一次提交的命令已被 GPU 执行完毕。
    pub fn populate_command_list(
        &self,
        command_allocator: &ID3D12CommandAllocator,
        target: &FrameTarget<'_>,
    ) -> Result<()> {
        unsafe {
            command_allocator
                .Reset()
                .map_err(graphics_error(GraphicsError::CommandExecution, "CommandAllocator::Reset"))?;
            self.command_list
                .Reset(command_allocator, &self.pipeline_state)
                .map_err(graphics_error(GraphicsError::CommandExecution, "CommandList::Reset"))?;

            self.command_list.SetGraphicsRootSignature(&self.root_signature);
            if let (TriangleMode::Parameterized, Some(address)) = (self.mode, target.constant_buffer) {
                self.command_list
                    .SetGraphicsRootConstantBufferView(CONSTANT_BUFFER_ROOT_PARAMETER, address);
            }
            self.command_list.RSSetViewports(&[self.viewport]);
            self.command_list.RSSetScissorRects(&[self.scissor_rect]);

            self.command_list.ResourceBarrier(&[transition_barrier(
                target.render_target,
                D3D12_RESOURCE_STATE_PRESENT,
                D3D12_RESOURCE_STATE_RENDER_TARGET,
            )]);

            self.command_list
                .OMSetRenderTargets(1, Some(&target.rtv_handle), false, None);
            self.command_list
                .ClearRenderTargetView(target.rtv_handle, &target.clear_color, None);
            self.command_list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
            self.command_list
                .IASetVertexBuffers(0, Some(&[self.vertex_buffer_view]));
            self.command_list.DrawInstanced(3, 1, 0, 0);

            self.command_list.ResourceBarrier(&[transition_barrier(
                target.render_target,
                D3D12_RESOURCE_STATE_RENDER_TARGET,
                D3D12_RESOURCE_STATE_PRESENT,
            )]);

            self.command_list
                .Close()
                .map_err(graphics_error(GraphicsError::CommandExecution, "CommandList::Close"))
        }
    }

    pub fn command_list(&self) -> Result<ID3D12CommandList> {
        self.command_list
            .cast()
            .map_err(graphics_error(GraphicsError::CommandExecution, "ID3D12CommandList cast"))
    }

    pub fn mode(&self) -> TriangleMode {
        self.mode
    }
}

/// 静态模式不需要任何根参数；参数化模式在 b0 放一个根 CBV
unsafe fn create_root_signature(
    device: &ID3D12Device,
    mode: TriangleMode,
) -> Result<ID3D12RootSignature> {
    let root_parameters = [D3D12_ROOT_PARAMETER {
        ParameterType: D3D12_ROOT_PARAMETER_TYPE_CBV,
        Anonymous: D3D12_ROOT_PARAMETER_0 {
            Descriptor: D3D12_ROOT_DESCRIPTOR {
                ShaderRegister: 0, // b0
                RegisterSpace: 0,
            },
        },
        ShaderVisibility: D3D12_SHADER_VISIBILITY_VERTEX,
    }];

    let (num_parameters, parameters) = if mode.uses_constant_buffer() {
        (root_parameters.len() as u32, root_parameters.as_ptr())
    } else {
        (0, std::ptr::null())
    };

    let root_desc = D3D12_ROOT_SIGNATURE_DESC {
        NumParameters: num_parameters,
        pParameters: parameters,
        NumStaticSamplers: 0,
        pStaticSamplers: std::ptr::null(),
        Flags: D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT,
    };

    let mut signature: Option<ID3DBlob> = None;
    let mut error: Option<ID3DBlob> = None;
    if let Err(e) = D3D12SerializeRootSignature(
        &root_desc,
        D3D_ROOT_SIGNATURE_VERSION_1,
        &mut signature,
        Some(&mut error),
    ) {
        let detail = error.map(|blob| blob_to_string(&blob)).unwrap_or_else(|| e.to_string());
        return Err(GraphicsError::ResourceCreation(format!(
            "Failed to serialize root signature: {}",
            detail
        ))
        .into());
    }
    let signature = signature.ok_or_else(|| {
        GraphicsError::ResourceCreation("Root signature serialization returned no blob".to_string())
    })?;

    device
        .CreateRootSignature(0, blob_bytes(&signature))
        .map_err(graphics_error(GraphicsError::ResourceCreation, "CreateRootSignature"))
}

/// 使用 FXC 编译一个入口函数
unsafe fn compile_shader(source: &str, stage: ShaderStage) -> Result<ID3DBlob> {
    let entry_point = CString::new(stage.entry_point)
        .map_err(|e| GraphicsError::ShaderCompilation(e.to_string()))?;
    let target = CString::new(stage.target)
        .map_err(|e| GraphicsError::ShaderCompilation(e.to_string()))?;

    let flags = if cfg!(debug_assertions) {
        D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
    } else {
        0
    };

    let mut blob: Option<ID3DBlob> = None;
    let mut error_blob: Option<ID3DBlob> = None;
    let result = D3DCompile(
        source.as_ptr() as _,
        source.len(),
        None,
        None,
        None,
        PCSTR(entry_point.as_ptr() as *const u8),
        PCSTR(target.as_ptr() as *const u8),
        flags,
        0,
        &mut blob,
        Some(&mut error_blob),
    );

    if let Err(e) = result {
        let message = error_blob
            .map(|error| blob_to_string(&error))
            .unwrap_or_else(|| e.to_string());
        return Err(GraphicsError::ShaderCompilation(format!(
            "{} ({}): {}",
            stage.entry_point, stage.target, message
        ))
        .into());
    }

    debug!(entry_point = stage.entry_point, target = stage.target, "Shader compiled");

    blob.ok_or_else(|| {
        GraphicsError::ShaderCompilation(format!("{} produced no bytecode", stage.entry_point)).into()
    })
}

unsafe fn create_pipeline_state(
    device: &ID3D12Device,
    root_signature: &ID3D12RootSignature,
    vertex_shader: &ID3DBlob,
    pixel_shader: &ID3DBlob,
) -> Result<ID3D12PipelineState> {
    let input_element_descs = [
        D3D12_INPUT_ELEMENT_DESC {
            SemanticName: windows::core::s!("POSITION"),
            SemanticIndex: 0,
            Format: DXGI_FORMAT_R32G32B32_FLOAT,
            InputSlot: 0,
            AlignedByteOffset: 0,
            InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        },
        D3D12_INPUT_ELEMENT_DESC {
            SemanticName: windows::core::s!("COLOR"),
            SemanticIndex: 0,
            Format: DXGI_FORMAT_R32G32B32A32_FLOAT,
            InputSlot: 0,
            AlignedByteOffset: Vertex::COLOR_OFFSET,
            InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        },
    ];

    let mut pso_desc = D3D12_GRAPHICS_PIPELINE_STATE_DESC {
        pRootSignature: ManuallyDrop::new(Some(root_signature.clone())),
        VS: D3D12_SHADER_BYTECODE {
            pShaderBytecode: vertex_shader.GetBufferPointer(),
            BytecodeLength: vertex_shader.GetBufferSize(),
        },
        PS: D3D12_SHADER_BYTECODE {
            pShaderBytecode: pixel_shader.GetBufferPointer(),
            BytecodeLength: pixel_shader.GetBufferSize(),
        },
        BlendState: D3D12_BLEND_DESC {
            AlphaToCoverageEnable: false.into(),
            IndependentBlendEnable: false.into(),
            RenderTarget: [D3D12_RENDER_TARGET_BLEND_DESC {
                BlendEnable: false.into(),
                LogicOpEnable: false.into(),
                SrcBlend: D3D12_BLEND_ONE,
                DestBlend: D3D12_BLEND_ZERO,
                BlendOp: D3D12_BLEND_OP_ADD,
                SrcBlendAlpha: D3D12_BLEND_ONE,
                DestBlendAlpha: D3D12_BLEND_ZERO,
                BlendOpAlpha: D3D12_BLEND_OP_ADD,
                LogicOp: D3D12_LOGIC_OP_NOOP,
                RenderTargetWriteMask: D3D12_COLOR_WRITE_ENABLE_ALL.0 as u8,
            }; 8],
        },
        SampleMask: u32::MAX,
        RasterizerState: D3D12_RASTERIZER_DESC {
            FillMode: D3D12_FILL_MODE_SOLID,
            CullMode: D3D12_CULL_MODE_BACK,
            DepthClipEnable: true.into(),
            ..Default::default()
        },
        // 没有深度缓冲区
        DepthStencilState: D3D12_DEPTH_STENCIL_DESC {
            DepthEnable: false.into(),
            StencilEnable: false.into(),
            ..Default::default()
        },
        InputLayout: D3D12_INPUT_LAYOUT_DESC {
            pInputElementDescs: input_element_descs.as_ptr(),
            NumElements: input_element_descs.len() as u32,
        },
        PrimitiveTopologyType: D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE,
        NumRenderTargets: 1,
        SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
        ..Default::default()
    };
    pso_desc.RTVFormats[0] = BACK_BUFFER_FORMAT;

    let pipeline_state = device.CreateGraphicsPipelineState(&pso_desc);

    // 释放描述结构中持有的根签名引用
    ManuallyDrop::drop(&mut pso_desc.pRootSignature);

    pipeline_state.map_err(graphics_error(GraphicsError::ResourceCreation, "CreateGraphicsPipelineState"))
}

/// 在上传堆上创建顶点缓冲区并一次性写入
unsafe fn create_vertex_buffer(
    device: &ID3D12Device,
    vertices: &[Vertex],
) -> Result<(ID3D12Resource, D3D12_VERTEX_BUFFER_VIEW)> {
    let bytes: &[u8] = bytemuck::cast_slice(vertices);
    let vertex_buffer = create_upload_buffer(device, bytes.len() as u64)?;

    // CPU 不读取该资源
    let read_range = D3D12_RANGE { Begin: 0, End: 0 };
    let mut data = std::ptr::null_mut();
    vertex_buffer
        .Map(0, Some(&read_range), Some(&mut data))
        .map_err(graphics_error(GraphicsError::ResourceCreation, "Map(vertex buffer)"))?;
    std::ptr::copy_nonoverlapping(bytes.as_ptr(), data as *mut u8, bytes.len());
    vertex_buffer.Unmap(0, None);

    let view = D3D12_VERTEX_BUFFER_VIEW {
        BufferLocation: vertex_buffer.GetGPUVirtualAddress(),
        SizeInBytes: bytes.len() as u32,
        StrideInBytes: Vertex::STRIDE,
    };

    debug!(size = bytes.len(), vertices = vertices.len(), "Vertex buffer uploaded");

    Ok((vertex_buffer, view))
}

/// 上传堆上的缓冲区资源，初始状态为 GENERIC_READ
pub(crate) unsafe fn create_upload_buffer(device: &ID3D12Device, size: u64) -> Result<ID3D12Resource> {
    let heap_props = D3D12_HEAP_PROPERTIES {
        Type: D3D12_HEAP_TYPE_UPLOAD,
        ..Default::default()
    };
    let resource_desc = D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
        Width: size,
        Height: 1,
        DepthOrArraySize: 1,
        MipLevels: 1,
        SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
        Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
        ..Default::default()
    };

    let mut resource: Option<ID3D12Resource> = None;
    device
        .CreateCommittedResource(
            &heap_props,
            D3D12_HEAP_FLAG_NONE,
            &resource_desc,
            D3D12_RESOURCE_STATE_GENERIC_READ,
            None,
            &mut resource,
        )
        .map_err(graphics_error(GraphicsError::ResourceCreation, "CreateCommittedResource"))?;

    resource.ok_or_else(|| {
        GraphicsError::ResourceCreation("CreateCommittedResource returned no resource".to_string()).into()
    })
}

/// 不增加引用计数的状态转换屏障
fn transition_barrier(
    resource: &ID3D12Resource,
    state_before: D3D12_RESOURCE_STATES,
    state_after: D3D12_RESOURCE_STATES,
) -> D3D12_RESOURCE_BARRIER {
    D3D12_RESOURCE_BARRIER {
        Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
        Anonymous: D3D12_RESOURCE_BARRIER_0 {
            Transition: ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                pResource: unsafe { std::mem::transmute_copy(resource) },
                Subresource: D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
                StateBefore: state_before,
                StateAfter: state_after,
            }),
        },
    }
}

unsafe fn blob_bytes(blob: &ID3DBlob) -> &[u8] {
    std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize())
}

unsafe fn blob_to_string(blob: &ID3DBlob) -> String {
    String::from_utf8_lossy(blob_bytes(blob)).trim_end_matches('\0').trim().to_string()
}
