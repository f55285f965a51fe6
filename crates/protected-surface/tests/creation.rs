//! Tests for creating protected surfaces
//!

use common::{Event, Fault, MockManager, PARENT, Resource, doubles, manager, wait_for};
use protected_surface::{ConfigError, Error, PixelFormat, SurfaceConfig, SurfaceSize};

mod common;

#[test]
fn create_starts_one_loop() {
    let (harness, manager) = manager();

    let surface = manager.create_protected_surface(PARENT).unwrap();

    assert_ne!(surface, PARENT);
    assert_eq!(manager.coordinator().is_running(surface), Some(true));
    assert_eq!(manager.coordinator().context_count(), 1);
    assert_eq!(manager.coordinator().active_loops(), 1);
    assert_eq!(harness.live(), 4);
    assert!(wait_for(|| harness.count(|e| *e == Event::Present) > 0));
}

#[test]
fn exclusion_applied_before_show_and_present() {
    let (harness, manager) = manager();

    let surface = manager.create_protected_surface(PARENT).unwrap();
    assert!(wait_for(|| harness.count(|e| *e == Event::Present) > 0));

    let excluded = harness
        .position(|e| *e == Event::ExcludeFromCapture(surface))
        .expect("Exclusion should be recorded");
    let shown = harness.position(|e| *e == Event::Show(surface)).unwrap();
    let first_present = harness.position(|e| *e == Event::Present).unwrap();
    let channel = harness
        .position(|e| matches!(e, Event::CreateChannel(..)))
        .unwrap();

    assert!(excluded < shown);
    assert!(excluded < channel);
    assert!(excluded < first_present);
}

#[test]
fn channel_uses_config_descriptor() {
    let (harness, manager) = manager();

    let surface = manager.create_protected_surface(PARENT).unwrap();

    let descriptor = harness
        .events()
        .into_iter()
        .find_map(|event| match event {
            Event::CreateChannel(channel_surface, descriptor) if channel_surface == surface => {
                Some(descriptor)
            }
            _ => None,
        })
        .expect("Channel should be requested for the new surface");

    assert_eq!(descriptor.buffer_count, 2);
    assert_eq!(descriptor.format, PixelFormat::Bgra8Unorm);
    assert_eq!(descriptor.size, SurfaceSize::new(640, 360));
}

#[test]
fn channel_rejection_leaves_nothing() {
    let (harness, manager) = manager();
    harness.inject(Fault::CreateChannel);

    let result = manager.create_protected_surface(PARENT);

    assert!(matches!(result, Err(Error::ChannelNegotiationFailed(_))));
    assert_eq!(harness.live(), 0);
    assert_eq!(harness.releases(), vec![Resource::Context, Resource::Device]);
    assert_eq!(harness.count(|e| *e == Event::Present), 0);
    assert_eq!(manager.coordinator().context_count(), 0);
    assert_eq!(manager.coordinator().active_loops(), 0);

    // The partially created surface is destroyed and the user told once.
    assert_eq!(harness.count(|e| matches!(e, Event::Destroy(_))), 1);
    let notifications: Vec<String> = harness
        .events()
        .into_iter()
        .filter_map(|event| match event {
            Event::Notify(owner, message) if owner == PARENT => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].contains("protected swap chain"));
}

#[test]
fn device_failure_requests_no_channel() {
    let (harness, manager) = manager();
    harness.inject(Fault::CreateDevice);

    let result = manager.create_protected_surface(PARENT);

    assert!(matches!(result, Err(Error::DeviceCreationFailed(_))));
    assert_eq!(harness.count(|e| matches!(e, Event::CreateChannel(..))), 0);
    assert_eq!(harness.live(), 0);
    assert_eq!(harness.count(|e| matches!(e, Event::Destroy(_))), 1);
    assert!(
        harness
            .position(|e| matches!(e, Event::Notify(_, message) if message.contains("graphics device")))
            .is_some()
    );
}

#[test]
fn target_failure_releases_in_reverse_order() {
    let (harness, manager) = manager();
    harness.inject(Fault::CreateTarget);

    let result = manager.create_protected_surface(PARENT);

    assert!(matches!(result, Err(Error::ChannelNegotiationFailed(_))));
    assert_eq!(
        harness.releases(),
        vec![Resource::Channel, Resource::Context, Resource::Device]
    );
    assert_eq!(harness.live(), 0);
}

#[test]
fn surface_failure_acquires_no_graphics_resources() {
    let (harness, manager) = manager();
    harness.inject(Fault::CreateSurface);

    let result = manager.create_protected_surface(PARENT);

    assert!(matches!(result, Err(Error::SurfaceCreationFailed(_))));
    assert_eq!(harness.count(|e| *e == Event::CreateDevice), 0);
    assert_eq!(harness.count(|e| matches!(e, Event::Destroy(_))), 0);
    assert_eq!(harness.count(|e| matches!(e, Event::Notify(..))), 1);
}

#[test]
fn exclusion_failure_destroys_hidden_surface() {
    let (harness, manager) = manager();
    harness.inject(Fault::ExcludeFromCapture);

    let result = manager.create_protected_surface(PARENT);

    assert!(matches!(result, Err(Error::SurfaceCreationFailed(_))));
    assert_eq!(harness.count(|e| matches!(e, Event::Show(_))), 0);
    assert_eq!(harness.count(|e| matches!(e, Event::Destroy(_))), 1);
    assert_eq!(harness.count(|e| *e == Event::CreateDevice), 0);
}

#[test]
fn class_registered_once() {
    let (harness, manager) = manager();

    manager.create_protected_surface(PARENT).unwrap();
    manager.create_protected_surface(PARENT).unwrap();

    assert_eq!(harness.count(|e| *e == Event::RegisterClass), 1);
}

#[test]
fn failed_registration_is_not_retried() {
    let (harness, manager) = manager();
    harness.inject(Fault::RegisterClass);

    assert!(manager.create_protected_surface(PARENT).is_err());
    assert!(manager.create_protected_surface(PARENT).is_err());

    assert_eq!(harness.count(|e| *e == Event::RegisterClass), 1);
    assert_eq!(harness.count(|e| matches!(e, Event::CreateSurface(_))), 0);
}

#[test]
fn cached_registration_failure_keeps_its_cause() {
    let (harness, manager) = manager();
    harness.inject(Fault::RegisterClass);

    manager.create_protected_surface(PARENT).unwrap_err();
    let error = manager.create_protected_surface(PARENT).unwrap_err();

    assert!(matches!(error, Error::SurfaceCreationFailed(_)));
    let source = core::error::Error::source(&error).expect("Cause should be kept");
    assert_eq!(source.to_string(), "Mock class registration failed");
}

#[test]
fn invalid_config_rejected() {
    let (_harness, windows, backend) = doubles();

    let config = SurfaceConfig {
        buffer_count: 3,
        ..SurfaceConfig::default()
    };

    let result = MockManager::new(windows, backend, config);
    assert!(matches!(result, Err(ConfigError::BufferCount(3))));
}
