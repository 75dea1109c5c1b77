use std::ffi::{c_char, c_void, CStr};
use ash::vk;
use color_eyre::Result;
use crate::renderer::config::ContextConfig;

/// Loads Vulkan and keeps the Vulkan instance alive
pub struct RenderInstance {
    pub instance: ash::Instance,
    debug_utils: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    // Unloads the library when dropped, so it goes last
    pub entry: ash::Entry,
}

impl RenderInstance {
    const VALIDATION_LAYER: &'static CStr = c"VK_LAYER_KHRONOS_validation";
    const ENGINE_NAME: &'static CStr = c"ORIGAMI";

    pub fn new(
        config: &ContextConfig,
        window_extensions: &[&'static CStr],
    ) -> Result<Self> {
        let entry = unsafe { ash::Entry::load()? };

        let enable_validation = config.validation_enabled
            && Self::check_validation_supported(&entry)?;

        let instance = Self::create_instance(
            &entry,
            config,
            window_extensions,
            enable_validation,
        )?;

        let mut ins = Self {
            instance,
            debug_utils: None,
            entry,
        };

        if enable_validation {
            ins.debug_utils = Self::create_debug_utils_messenger(&ins.entry, &ins.instance)?;
        }

        Ok(ins)
    }

    pub fn validation_active(&self) -> bool {
        self.debug_utils.is_some()
    }

    fn create_instance(
        entry: &ash::Entry,
        config: &ContextConfig,
        window_extensions: &[&'static CStr],
        enable_validation: bool,
    ) -> Result<ash::Instance> {
        let application_name = config.application_name_c()?;
        let application_info = vk::ApplicationInfo::default()
            .application_name(&application_name)
            .application_version(vk::make_api_version(0, 0, 1, 0))
            .engine_name(Self::ENGINE_NAME)
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_2);

        let enabled_layer_names = if enable_validation {
            vec![Self::VALIDATION_LAYER.as_ptr()]
        } else {
            Vec::new()
        };
        let enabled_extension_names = Self::get_required_instance_extensions(
            window_extensions,
            enable_validation,
        )
            .iter()
            .map(|ext| ext.as_ptr())
            .collect::<Vec<*const c_char>>();

        let mut debug_info = debug_utils_messenger_create_info();
        let mut instance_info = vk::InstanceCreateInfo::default()
            .application_info(&application_info)
            .enabled_layer_names(&enabled_layer_names)
            .enabled_extension_names(&enabled_extension_names);

        // Also reports problems in instance creation itself
        if enable_validation {
            instance_info = instance_info.push_next(&mut debug_info);
        }

        #[cfg(target_os = "macos")]
        let instance_info = instance_info
            .flags(vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR);

        let instance = unsafe {
            entry.create_instance(&instance_info, None)?
        };
        log::info!(
            "Created Vulkan instance for {:?} (validation: {})",
            config.application_name,
            enable_validation,
        );

        Ok(instance)
    }

    /// Best effort: a missing entry point skips the messenger instead of failing.
    fn create_debug_utils_messenger(
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> Result<Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>> {
        let create_fn = unsafe {
            entry.get_instance_proc_addr(
                instance.handle(),
                c"vkCreateDebugUtilsMessengerEXT".as_ptr(),
            )
        };
        if create_fn.is_none() {
            log::warn!("vkCreateDebugUtilsMessengerEXT unavailable, validation messages will not be logged");
            return Ok(None);
        }

        let debug_utils_loader = ash::ext::debug_utils::Instance::new(entry, instance);
        let debug_utils_info = debug_utils_messenger_create_info();
        let debug_utils_messenger = unsafe {
            debug_utils_loader.create_debug_utils_messenger(&debug_utils_info, None)?
        };
        Ok(Some((debug_utils_loader, debug_utils_messenger)))
    }

    fn get_required_instance_extensions(
        window_extensions: &[&'static CStr],
        enable_validation: bool,
    ) -> Vec<&'static CStr> {
        let mut exts = window_extensions.to_vec();

        if enable_validation {
            exts.push(ash::ext::debug_utils::NAME);
        }

        #[cfg(target_os = "macos")]
        {
            exts.push(ash::khr::portability_enumeration::NAME);
            exts.push(ash::khr::get_physical_device_properties2::NAME);
        }

        exts
    }

    /// Validation needs both the layer and the debug utils extension. Either
    /// one missing downgrades to running without validation.
    fn check_validation_supported(entry: &ash::Entry) -> Result<bool> {
        let supported_layers = unsafe {
            entry.enumerate_instance_layer_properties()?
        };
        let layer_found = supported_layers
            .iter()
            .filter_map(|props| props.layer_name_as_c_str().ok())
            .any(|layer| layer == Self::VALIDATION_LAYER);
        if !layer_found {
            log::warn!("Validation layer {:?} not supported, continuing without it", Self::VALIDATION_LAYER);
            return Ok(false);
        }

        let supported_extensions = unsafe {
            entry.enumerate_instance_extension_properties(None)?
        };
        let debug_utils_found = supported_extensions
            .iter()
            .filter_map(|props| props.extension_name_as_c_str().ok())
            .any(|ext| ext == ash::ext::debug_utils::NAME);
        if !debug_utils_found {
            log::warn!("{:?} not supported, continuing without validation", ash::ext::debug_utils::NAME);
            return Ok(false);
        }

        Ok(true)
    }
}

impl Drop for RenderInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some((loader, messenger)) = self.debug_utils.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
        log::debug!("Destroyed Vulkan instance");
    }
}

fn debug_utils_messenger_create_info(
) -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
    let message_severity = vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR;
    let message_type = vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
        | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION;
    vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(message_severity)
        .message_type(message_type)
        .pfn_user_callback(Some(debug_callback))
}

unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut c_void,
) -> vk::Bool32 {
    let msg_type = match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "[General]",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "[Performance]",
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "[Validation]",
        _ => "[Unknown]",
    };
    let msg = unsafe {
        if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
            c"<no message>"
        } else {
            CStr::from_ptr((*p_callback_data).p_message)
        }
    };
    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => {
            log::trace!("[Verbose]{} {:?}", msg_type, msg);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            log::warn!("[Warning]{} {:?}", msg_type, msg);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            log::error!("[Error]{} {:?}", msg_type, msg);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            log::info!("[Info]{} {:?}", msg_type, msg);
        }
        _ => {
            log::warn!("[Unknown]{} {:?}", msg_type, msg);
        }
    }

    vk::FALSE
}
