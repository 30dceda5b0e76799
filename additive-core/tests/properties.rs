//! Property-based tests for range checks and message marshaling.
//!
//! Run with: cargo test -p additive-core --test properties

use additive_core::limits::Limits;
use additive_core::machine::{self, Machine};
use additive_core::{Material, PorosityInput, Range, SingleBeadInput};
use proptest::prelude::*;

// =============================================================================
// Machine bounds
// =============================================================================

type Setter = fn(&mut Machine, f64) -> additive_core::Result<()>;
type Getter = fn(&Machine) -> f64;

type Field = (&'static str, Limits, Setter, Getter);

fn field(name: &'static str, limits: Limits, set: Setter, get: Getter) -> Field {
    (name, limits, set, get)
}

fn machine_fields() -> Vec<Field> {
    use machine::*;
    vec![
        field("laser_power", LASER_POWER, Machine::set_laser_power, Machine::laser_power),
        field("scan_speed", SCAN_SPEED, Machine::set_scan_speed, Machine::scan_speed),
        field(
            "heater_temperature",
            HEATER_TEMPERATURE,
            Machine::set_heater_temperature,
            Machine::heater_temperature,
        ),
        field(
            "layer_thickness",
            LAYER_THICKNESS,
            Machine::set_layer_thickness,
            Machine::layer_thickness,
        ),
        field("beam_diameter", BEAM_DIAMETER, Machine::set_beam_diameter, Machine::beam_diameter),
        field(
            "starting_layer_angle",
            STARTING_LAYER_ANGLE,
            Machine::set_starting_layer_angle,
            Machine::starting_layer_angle,
        ),
        field(
            "layer_rotation_angle",
            LAYER_ROTATION_ANGLE,
            Machine::set_layer_rotation_angle,
            Machine::layer_rotation_angle,
        ),
        field("hatch_spacing", HATCH_SPACING, Machine::set_hatch_spacing, Machine::hatch_spacing),
        field(
            "slicing_stripe_width",
            SLICING_STRIPE_WIDTH,
            Machine::set_slicing_stripe_width,
            Machine::slicing_stripe_width,
        ),
    ]
}

#[test]
fn machine_boundaries_are_accepted() {
    for (name, limits, set, get) in machine_fields() {
        let mut m = Machine::default();
        assert_eq!(get(&m), limits.default, "{name} default");
        set(&mut m, limits.min).unwrap_or_else(|e| panic!("{name} min: {e}"));
        assert_eq!(get(&m), limits.min);
        set(&mut m, limits.max).unwrap_or_else(|e| panic!("{name} max: {e}"));
        assert_eq!(get(&m), limits.max);
    }
}

proptest! {
    #[test]
    fn machine_rejects_out_of_range(field in 0usize..9, offset in 1e-9f64..1e3, above in any::<bool>()) {
        let fields = machine_fields();
        let (name, limits, set, get) = fields[field];
        let span = limits.max - limits.min;
        let value = if above {
            limits.max + span * offset
        } else {
            limits.min - span * offset
        };
        let mut m = Machine::default();
        let err = set(&mut m, value).unwrap_err();
        let prefix = format!("{} must be between ", name);
        prop_assert!(err.to_string().starts_with(&prefix));
        // A rejected assignment leaves the previous value in place.
        prop_assert_eq!(get(&m), limits.default);
    }

    #[test]
    fn machine_accepts_in_range(field in 0usize..9, t in 0.0f64..=1.0) {
        let fields = machine_fields();
        let (_, limits, set, get) = fields[field];
        let value = (limits.min + (limits.max - limits.min) * t).clamp(limits.min, limits.max);
        let mut m = Machine::default();
        prop_assert!(set(&mut m, value).is_ok());
        prop_assert_eq!(get(&m), value);
    }

    #[test]
    fn machine_message_round_trip(power in 50.0f64..=700.0, speed in 0.35f64..=2.5) {
        let mut m = Machine::default();
        m.set_laser_power(power).unwrap();
        m.set_scan_speed(speed).unwrap();
        let back = Machine::from_message(&m.to_message()).unwrap();
        prop_assert_eq!(back, m);
    }

    // =========================================================================
    // Range
    // =========================================================================

    #[test]
    fn range_round_trip(a in -1e6f64..1e6, b in -1e6f64..1e6) {
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        let range = Range::new(min, max).unwrap();
        let back = Range::from_message(&range.to_message()).unwrap();
        prop_assert_eq!(back.min(), min);
        prop_assert_eq!(back.max(), max);
    }

    #[test]
    fn range_rejects_inverted(a in -1e6f64..1e6, gap in 1e-6f64..1e3) {
        prop_assert!(Range::new(a + gap, a).is_err());
    }

    // =========================================================================
    // Requests
    // =========================================================================

    #[test]
    fn single_bead_request_is_idempotent(id in "[a-z0-9-]{0,16}", length in 1e-3f64..=1e-2) {
        let input = SingleBeadInput::new(id, Machine::default(), Material::named("316L"))
            .with_bead_length(length)
            .unwrap();
        prop_assert_eq!(input.to_request(), input.to_request());
    }

    #[test]
    fn porosity_request_is_idempotent(x in 1e-3f64..=1e-2, y in 1e-3f64..=1e-2, z in 1e-3f64..=1e-2) {
        let mut input = PorosityInput::default();
        input.set_size_x(x).unwrap();
        input.set_size_y(y).unwrap();
        input.set_size_z(z).unwrap();
        prop_assert_eq!(input.to_request(), input.to_request());
    }
}
