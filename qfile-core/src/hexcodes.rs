//! Таблица hex-кодов: числовой идентификатор канала -> метаданные.
//!
//! Схема идентификатора: старшие 12 бит (0xFFF0) выбирают базовую
//! запись таблицы, младшие 4 бита (0x000F) — номер экземпляра (0–15).
//! Например 0x610 -> "sh_0" (сдвиговый зонд №0), 0x611 -> "sh_1".
//!
//! Таблица собрана из прошивочной документации логгера и неизменна на
//! время процесса. Уникальность базовых кодов — инвариант старта:
//! однажды в таблицу уже попал дубль, и его искали неделю.

use std::collections::HashMap;

use log::warn;
use once_cell::sync::Lazy;
use qfile_types::{ChannelDescriptor, ChannelKind, QfError, QfResult};

/// Имя базовой записи: как из него получается имя конкретного
/// экземпляра канала.
#[derive(Debug, Clone, Copy)]
enum BaseName {
    /// Номер экземпляра дописывается к суффиксу: "sh_" -> "sh_1"
    Suffixed(&'static str),
    /// Имена перечислены по экземплярам; номер вне списка — канал
    /// неизвестен
    Listed(&'static [&'static str]),
    /// Одно имя на все экземпляры
    Plain(&'static str),
}

impl BaseName {
    fn resolve(&self, instance: usize) -> Option<String> {
        match self {
            BaseName::Suffixed(prefix) => Some(format!("{prefix}{instance}")),
            BaseName::Listed(names) => names.get(instance).map(|s| (*s).to_string()),
            BaseName::Plain(name) => Some((*name).to_string()),
        }
    }
}

/// Физические единицы базовой записи.
#[derive(Debug, Clone, Copy)]
enum Units {
    None,
    Plain(&'static str),
    /// По экземплярам; вне списка единицы просто не заданы
    PerInstance(&'static [&'static str]),
}

impl Units {
    fn resolve(&self, instance: usize) -> Option<&'static str> {
        match self {
            Units::None => None,
            Units::Plain(u) => Some(u),
            Units::PerInstance(list) => list.get(instance).copied(),
        }
    }
}

struct HexEntry {
    base: u16,
    name: BaseName,
    long_name: BaseName,
    units: Units,
    kind: ChannelKind,
}

const fn scalar(base: u16, name: BaseName, long_name: BaseName, units: Units) -> HexEntry {
    HexEntry {
        base,
        name,
        long_name,
        units,
        kind: ChannelKind::Scalar,
    }
}

const fn spectral(base: u16, name: BaseName, long_name: BaseName, units: Units) -> HexEntry {
    HexEntry {
        base,
        name,
        long_name,
        units,
        kind: ChannelKind::Spectral,
    }
}

use BaseName::{Listed, Plain, Suffixed};

/// Базовые записи таблицы. Группа 0x910–0x9B0 — частотные спектры,
/// остальное — скаляры.
static TABLE: &[HexEntry] = &[
    scalar(0x010, Suffixed("dT_"), Suffixed("preThermal_"), Units::None),
    scalar(0x020, Suffixed("dC_"), Suffixed("preUConductivity_"), Units::None),
    scalar(0x030, Plain("P_dP"), Plain("prePressure"), Units::None),
    scalar(
        0x110,
        Listed(&["A0", "Ax", "Ay", "Az"]),
        Listed(&[
            "acceleration_0",
            "acceleration_X",
            "acceleration_Y",
            "acceleration_Z",
        ]),
        Units::None,
    ),
    scalar(
        0x120,
        Listed(&["A0", "Ax", "Ay"]),
        Listed(&["piezo_0", "piezo_X", "piezo_Y"]),
        Units::None,
    ),
    scalar(
        0x130,
        Listed(&["Incl_0", "Incl_X", "Incl_Y", "Incl_T"]),
        Listed(&[
            "Inclinometer_0",
            "Inclinometer_X",
            "Inclinometer_Y",
            "Inclinometer_T",
        ]),
        Units::PerInstance(&["degrees", "degrees", "Celsius"]),
    ),
    scalar(
        0x140,
        Listed(&["theta_0", "thetaX", "thetaY"]),
        Listed(&["Theta_0", "Theta_X", "Theta_Y"]),
        Units::Plain("degrees"),
    ),
    scalar(
        0x150,
        Listed(&["M_0", "Mx", "My", "Mz"]),
        Listed(&["magnetic_0", "magnetic_X", "magnetic_Y", "magnetic_Z"]),
        Units::None,
    ),
    scalar(0x160, Plain("pressure"), Plain("pressure_ocean"), Units::Plain("decibar")),
    scalar(0x170, Plain("AOA"), Plain("angle_of_attack"), Units::Plain("degrees")),
    scalar(0x210, Plain("VBat"), Plain("battery"), Units::Plain("Volts")),
    scalar(0x220, Plain("PV"), Plain("pressure_transducer"), Units::Plain("Volts")),
    scalar(0x230, Plain("EMCur"), Plain("EM_current"), Units::Plain("Amps")),
    scalar(
        0x240,
        Listed(&["latitude", "longitude"]),
        Listed(&["Latitude", "Longitude"]),
        Units::PerInstance(&["degrees North", "degrees East"]),
    ),
    scalar(0x250, Plain("noise"), Plain("glider_noise"), Units::None),
    scalar(0x310, Plain("EM"), Plain("speed"), Units::Plain("meters/second")),
    scalar(
        0x320,
        Listed(&["U", "V", "W", "speed_squared"]),
        Listed(&[
            "velocity_eastward",
            "velocity_northward",
            "velocity_upwards",
            "velocity_squared",
        ]),
        Units::PerInstance(&[
            "meters/second",
            "meters/second",
            "meters/second",
            "meters^2/second^2",
        ]),
    ),
    scalar(0x330, Plain("dzdt"), Plain("fallRate"), Units::Plain("meters/second")),
    scalar(
        0x340,
        Plain("dzdt_adj"),
        Plain("fallRate_adjusted_for_AOA"),
        Units::Plain("meters/second"),
    ),
    scalar(0x350, Plain("speed_hotel"), Plain("speed_hotel"), Units::Plain("meters/second")),
    scalar(0x360, Plain("speed"), Plain("speed_computation"), Units::Plain("meters/second")),
    scalar(
        0x410,
        Listed(&[
            "temperature_JAC",
            "temperature_SB",
            "temperature_RBR",
            "temperature_Hotel",
            "temperature_Contant",
        ]),
        Plain("temperature"),
        Units::Plain("Celsius"),
    ),
    scalar(
        0x420,
        Listed(&[
            "conductivity_JAC",
            "conductivity_SB",
            "conductivity_RBR",
            "conductivity_Hotel",
            "conductivity_Constant",
        ]),
        Plain("conductivity"),
        Units::None,
    ),
    scalar(
        0x430,
        Listed(&[
            "salinity_JAC",
            "salinity_SB",
            "salinity_RBR",
            "salinity_Hotel",
            "salinity_Constant",
        ]),
        Plain("salinity"),
        Units::Plain("PSU"),
    ),
    scalar(0x440, Plain("sigma0"), Plain("sigma_0"), Units::Plain("kilogram/meter^3")),
    scalar(0x450, Plain("visc"), Plain("viscosity"), Units::Plain("meter^2/second")),
    scalar(0x510, Plain("chlor"), Plain("chlorophyll"), Units::None),
    scalar(0x520, Plain("turb"), Plain("turbidity"), Units::None),
    scalar(0x530, Plain("DO"), Plain("dissolved_oxygen"), Units::None),
    scalar(0x610, Suffixed("sh_"), Suffixed("shear_"), Units::None),
    scalar(0x620, Suffixed("T_"), Suffixed("temperature_"), Units::Plain("Celsius")),
    scalar(0x630, Suffixed("C_"), Suffixed("microConductivity_"), Units::None),
    scalar(
        0x640,
        Suffixed("dT_"),
        Suffixed("gradient_temperature_"),
        Units::Plain("Celsius/meter"),
    ),
    scalar(0x650, Suffixed("dC_"), Suffixed("gradient_conductivity_"), Units::None),
    scalar(0x710, Suffixed("sh_GTD_"), Suffixed("shear_goodman_"), Units::None),
    scalar(0x720, Suffixed("sh_DSP_"), Suffixed("shear_despiked_"), Units::None),
    scalar(
        0x730,
        Suffixed("uCond_DSP_"),
        Suffixed("microConductivity_despiked_"),
        Units::None,
    ),
    scalar(0x740, Suffixed("sh_fraction_"), Suffixed("shear_fraction_"), Units::None),
    scalar(0x750, Suffixed("sh_passes_"), Suffixed("shear_passes_"), Units::None),
    scalar(
        0x760,
        Suffixed("uCond_fraction_"),
        Suffixed("microConductivity_fraction_"),
        Units::None,
    ),
    scalar(
        0x770,
        Suffixed("uCond_passes_"),
        Suffixed("microConductivity_passes_"),
        Units::None,
    ),
    scalar(0x810, Suffixed("K_max_"), Suffixed("integration_limit_"), Units::None),
    scalar(0x820, Suffixed("var_res_"), Suffixed("variance_resolved_"), Units::None),
    scalar(0x830, Suffixed("MAD_"), Suffixed("mean_averaged_deviation_"), Units::None),
    scalar(0x840, Suffixed("FM_"), Suffixed("figure_of_merit_"), Units::None),
    scalar(0x850, Suffixed("CI_"), Suffixed("confidence_interval_"), Units::None),
    scalar(
        0x860,
        Suffixed("MAD_T_"),
        Suffixed("mean_average_deviation_temperature_"),
        Units::None,
    ),
    scalar(0x870, Suffixed("QC_"), Suffixed("quality_control_flags_"), Units::None),
    spectral(0x910, Plain("freq"), Plain("frequency"), Units::None),
    spectral(0x920, Plain("shear_raw"), Plain("shear_raw"), Units::None),
    spectral(0x930, Suffixed("shear_gfd_"), Suffixed("shear_goodman_"), Units::None),
    spectral(0x940, Plain("gradT_raw"), Plain("thermistor_raw"), Units::None),
    spectral(0x950, Suffixed("gradT_gfd_"), Suffixed("thermistor_goodman_"), Units::None),
    spectral(0x960, Plain("uCond_raw"), Plain("microConductivity_raw"), Units::None),
    spectral(
        0x970,
        Suffixed("uCond_gfd_"),
        Suffixed("microConductivity_goodman_"),
        Units::None,
    ),
    spectral(0x980, Plain("piezo"), Plain("vibration"), Units::None),
    spectral(0x990, Plain("accel"), Plain("accelerometer"), Units::None),
    spectral(0x9A0, Plain("T_ref"), Plain("temperature_reference"), Units::None),
    spectral(0x9B0, Plain("T_noise"), Plain("temperature_noise"), Units::None),
    scalar(0xA10, Suffixed("e_"), Suffixed("epsilon_"), Units::None),
    scalar(0xA20, Plain("N2"), Plain("buoyancy_frequency"), Units::None),
    scalar(0xA30, Plain("eddy_diff"), Plain("eddy_diffusivity"), Units::None),
    scalar(0xA40, Suffixed("chi_"), Suffixed("chi_"), Units::None),
    scalar(0xA50, Suffixed("e_T_"), Suffixed("thermal_dissipation_"), Units::None),
    // diagnostic_: значения, которых в потоке быть не должно
    scalar(0xD20, Suffixed("diagnostic_"), Suffixed("diagnostic_"), Units::None),
];

/// Развёрнутая карта id -> дескриптор по всем экземплярам.
static IDENT_MAP: Lazy<HashMap<u16, ChannelDescriptor>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for entry in TABLE {
        for instance in 0..16usize {
            let Some(name) = entry.name.resolve(instance) else {
                continue; // номер вне списка имён
            };
            let long_name = entry
                .long_name
                .resolve(instance)
                .unwrap_or_else(|| name.clone());
            let id = entry.base | instance as u16;
            let prev = map.insert(
                id,
                ChannelDescriptor {
                    id,
                    name,
                    long_name,
                    units: entry.units.resolve(instance),
                    kind: entry.kind,
                },
            );
            // Инвариант старта: базовые коды уникальны
            assert!(prev.is_none(), "duplicate channel identifier {id:#06x}");
        }
    }
    map
});

/// Дескриптор канала по полному идентификатору.
///
/// `UnknownChannel` для идентификаторов вне таблицы (в том числе для
/// номера экземпляра за пределами списка имён).
pub fn lookup(id: u16) -> QfResult<&'static ChannelDescriptor> {
    match IDENT_MAP.get(&id) {
        Some(d) => Ok(d),
        None => {
            warn!("channel identifier {id:#06x} not in hex code table");
            Err(QfError::UnknownChannel(id))
        }
    }
}

/// Обратный поиск: имя канала -> идентификатор.
///
/// "sh_1" -> 0x611, "pressure" -> 0x160, "Az" -> 0x113.
pub fn name_to_ident(name: &str) -> Option<u16> {
    let (prefix, instance) = split_instance(name);

    for entry in TABLE {
        match entry.name {
            Suffixed(p) if p == prefix => return Some(entry.base | instance as u16),
            Plain(p) if p == name => return Some(entry.base),
            Listed(names) => {
                if let Some(idx) = names.iter().position(|n| *n == name) {
                    return Some(entry.base | idx as u16);
                }
            }
            _ => {}
        }
    }
    warn!("channel name {name:?} not in hex code table");
    None
}

/// Число известных идентификаторов (все экземпляры).
pub fn known_ident_count() -> usize {
    IDENT_MAP.len()
}

/// "sh_12" -> ("sh_", 12); имена без суффиксного номера — экземпляр 0.
fn split_instance(name: &str) -> (&str, usize) {
    let digits = name
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .count();
    if digits == 0 {
        return (name, 0);
    }
    let (prefix, num) = name.split_at(name.len() - digits);
    if !prefix.ends_with('_') {
        return (name, 0);
    }
    match num.parse::<usize>() {
        Ok(n) if n < 16 => (prefix, n),
        _ => (name, 0),
    }
}
