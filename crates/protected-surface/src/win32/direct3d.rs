use tracing::instrument;
use windows::Win32::{
    Foundation::HMODULE,
    Graphics::{
        Direct3D::D3D_DRIVER_TYPE_HARDWARE,
        Direct3D11::{
            D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_SDK_VERSION, D3D11CreateDevice, ID3D11Device,
            ID3D11DeviceContext, ID3D11RenderTargetView, ID3D11Texture2D,
        },
        Dxgi::{
            Common::{
                DXGI_ALPHA_MODE_UNSPECIFIED, DXGI_FORMAT, DXGI_FORMAT_B8G8R8A8_UNORM,
                DXGI_FORMAT_R8G8B8A8_UNORM, DXGI_FORMAT_R10G10B10A2_UNORM,
                DXGI_FORMAT_R16G16B16A16_FLOAT, DXGI_SAMPLE_DESC,
            },
            DXGI_ERROR_DEVICE_REMOVED, DXGI_ERROR_DEVICE_RESET, DXGI_PRESENT,
            DXGI_SCALING_STRETCH, DXGI_STATUS_OCCLUDED, DXGI_SWAP_CHAIN_DESC1,
            DXGI_SWAP_CHAIN_FLAG_HW_PROTECTED, DXGI_SWAP_EFFECT_FLIP_SEQUENTIAL,
            DXGI_USAGE_RENDER_TARGET_OUTPUT, IDXGIDevice, IDXGIFactory2, IDXGISwapChain1,
        },
    },
};
use windows_core::Interface;

use crate::{ChannelDescriptor, GraphicsBackend, PixelFormat, PresentError, PresentStatus};

use super::{LabelledWinResult, SendInterface, WinError, Win32Surface};

/// D3D11 device with a hardware-protected DXGI flip model swap chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct Direct3D;

impl GraphicsBackend for Direct3D {
    type Surface = Win32Surface;
    type Device = SendInterface<ID3D11Device>;
    type CommandContext = SendInterface<ID3D11DeviceContext>;
    type Channel = SendInterface<IDXGISwapChain1>;
    type Target = SendInterface<ID3D11RenderTargetView>;
    type Error = WinError;

    #[instrument("Direct3D::create_device", skip_all, err)]
    fn create_device(&self) -> LabelledWinResult<(Self::Device, Self::CommandContext)> {
        let mut device = None;
        let mut context = None;

        // WARP has no protected output path, only hardware devices are useful here.
        unsafe {
            D3D11CreateDevice(
                None,
                D3D_DRIVER_TYPE_HARDWARE,
                HMODULE::default(),
                D3D11_CREATE_DEVICE_BGRA_SUPPORT,
                None,
                D3D11_SDK_VERSION,
                Some(&mut device),
                None,
                Some(&mut context),
            )
        }
        .map_err(|e| WinError::new(e, "D3D11CreateDevice"))?;

        let device = device.ok_or_else(|| WinError::missing("D3D11CreateDevice"))?;
        let context = context.ok_or_else(|| WinError::missing("D3D11CreateDevice"))?;

        Ok((SendInterface(device), SendInterface(context)))
    }

    #[instrument("Direct3D::create_protected_channel", skip(self, device), err)]
    fn create_protected_channel(
        &self,
        device: &Self::Device,
        surface: Win32Surface,
        descriptor: &ChannelDescriptor,
    ) -> LabelledWinResult<Self::Channel> {
        // Adapter and factory are released when they go out of scope.
        let dxgi_device: IDXGIDevice = device
            .cast()
            .map_err(|e| WinError::new(e, "ID3D11Device::cast"))?;

        let adapter = unsafe { dxgi_device.GetAdapter() }
            .map_err(|e| WinError::new(e, "IDXGIDevice::GetAdapter"))?;

        let factory: IDXGIFactory2 = unsafe { adapter.GetParent() }
            .map_err(|e| WinError::new(e, "IDXGIAdapter::GetParent"))?;

        let desc = DXGI_SWAP_CHAIN_DESC1 {
            Width: descriptor.size.width,
            Height: descriptor.size.height,
            Format: dxgi_format(descriptor.format),
            Stereo: false.into(),
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: descriptor.buffer_count,
            Scaling: DXGI_SCALING_STRETCH,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_SEQUENTIAL,
            AlphaMode: DXGI_ALPHA_MODE_UNSPECIFIED,
            Flags: DXGI_SWAP_CHAIN_FLAG_HW_PROTECTED.0 as u32,
        };

        let swap_chain =
            unsafe { factory.CreateSwapChainForHwnd(&device.0, surface.hwnd(), &desc, None, None) }
                .map_err(|e| WinError::new(e, "IDXGIFactory2::CreateSwapChainForHwnd"))?;

        Ok(SendInterface(swap_chain))
    }

    #[instrument("Direct3D::create_target", skip_all, err)]
    fn create_target(
        &self,
        device: &Self::Device,
        channel: &Self::Channel,
    ) -> LabelledWinResult<Self::Target> {
        let back_buffer: ID3D11Texture2D = unsafe { channel.GetBuffer(0) }
            .map_err(|e| WinError::new(e, "IDXGISwapChain1::GetBuffer"))?;

        let mut target = None;
        unsafe { device.CreateRenderTargetView(&back_buffer, None, Some(&mut target)) }
            .map_err(|e| WinError::new(e, "ID3D11Device::CreateRenderTargetView"))?;

        let target = target.ok_or_else(|| WinError::missing("ID3D11Device::CreateRenderTargetView"))?;

        Ok(SendInterface(target))
    }

    fn clear(&self, context: &Self::CommandContext, target: &Self::Target, colour: [f32; 4]) {
        unsafe {
            context.OMSetRenderTargets(Some(&[Some(target.0.clone())]), None);
            context.ClearRenderTargetView(&target.0, &colour);
        }
    }

    fn present(
        &self,
        channel: &Self::Channel,
        sync_interval: u32,
    ) -> Result<PresentStatus, PresentError> {
        let result = unsafe { channel.Present(sync_interval, DXGI_PRESENT(0)) };

        if result == DXGI_ERROR_DEVICE_REMOVED || result == DXGI_ERROR_DEVICE_RESET {
            let error = WinError::new(result.into(), "IDXGISwapChain::Present");
            return Err(PresentError::DeviceLost(Box::new(error)));
        }

        // Returned immediately while minimized or covered, without waiting for a vblank.
        if result == DXGI_STATUS_OCCLUDED {
            return Ok(PresentStatus::Occluded);
        }

        result.ok().map(|()| PresentStatus::Presented).map_err(|e| {
            PresentError::Failed(Box::new(WinError::new(e, "IDXGISwapChain::Present")))
        })
    }
}

fn dxgi_format(format: PixelFormat) -> DXGI_FORMAT {
    match format {
        PixelFormat::Bgra8Unorm => DXGI_FORMAT_B8G8R8A8_UNORM,
        PixelFormat::Rgba8Unorm => DXGI_FORMAT_R8G8B8A8_UNORM,
        PixelFormat::Rgb10A2Unorm => DXGI_FORMAT_R10G10B10A2_UNORM,
        PixelFormat::Rgba16Float => DXGI_FORMAT_R16G16B16A16_FLOAT,
    }
}
