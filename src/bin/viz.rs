use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use pilot_assist::flight::{ControlCommand, FlightState, SimConfig};
use pilot_assist::sim::event::{EventDetector, HeadingCaptureDetector};
use pilot_assist::sim::{self, Scenario};
use pilot_assist::VehicleAutopilot;

const TARGET_HEADING: f64 = 135.0;

fn main() -> eframe::Result {
    env_logger::init();

    let scenario = Scenario::cruise(0.0, 1000.0, 100.0);
    let config = SimConfig { dt: 0.02, max_time: 120.0 };
    let start = scenario.initial.flight_state(scenario.origin_latitude);

    let mut autopilot = VehicleAutopilot::default();
    autopilot.hold_heading(TARGET_HEADING, &start);
    autopilot.hold_altitude(1500.0, &start);
    autopilot.hold_speed(100.0, &start);

    let mut detectors: Vec<Box<dyn EventDetector>> =
        vec![Box::new(HeadingCaptureDetector::new(TARGET_HEADING, 2.0))];
    let result = sim::simulate(&scenario, &config, &mut autopilot, &mut detectors);
    let captured = result.events.first().map(|e| e.time);

    let app = FlightViz { states: result.states, commands: result.commands, captured };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("Pilot Assist", options, Box::new(|_| Ok(Box::new(app))))
}

struct FlightViz {
    states: Vec<FlightState>,
    commands: Vec<ControlCommand>,
    captured: Option<f64>,
}

impl FlightViz {
    fn series(&self, f: impl Fn(&FlightState) -> f64) -> PlotPoints<'static> {
        self.states.iter().map(|s| [s.time, f(s)]).collect()
    }

    fn command_series(&self, f: impl Fn(&ControlCommand) -> f64) -> PlotPoints<'static> {
        self.states
            .iter()
            .zip(&self.commands)
            .map(|(s, c)| [s.time, f(c)])
            .collect()
    }
}

impl eframe::App for FlightViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading(format!("Heading hold to {:.0} deg", TARGET_HEADING));
            let max_bank = self.states.iter().map(|s| s.roll.abs()).fold(0.0_f64, f64::max);
            ui.label(format!(
                "Captured: {}  |  Max bank: {:.1} deg  |  Flight: {:.0} s",
                self.captured.map_or("never".to_string(), |t| format!("{:.1} s", t)),
                max_bank,
                self.states.last().map_or(0.0, |s| s.time),
            ));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let half_w = available.x / 2.0 - 8.0;
            let half_h = available.y / 2.0 - 8.0;

            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.label("Heading (deg)");
                    let points = self.series(|s| s.heading);
                    Plot::new("heading")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Heading", points));
                        });
                });

                ui.vertical(|ui| {
                    ui.label("Altitude (m)");
                    let points = self.series(|s| s.altitude);
                    Plot::new("altitude")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Altitude", points));
                        });
                });
            });

            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.label("Attitude (deg)");
                    let bank = self.series(|s| s.roll);
                    let pitch = self.series(|s| s.pitch);
                    Plot::new("attitude")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .legend(Legend::default())
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Bank", bank));
                            plot_ui.line(Line::new("Pitch", pitch));
                        });
                });

                ui.vertical(|ui| {
                    ui.label("Commands");
                    let roll = self.command_series(|c| c.roll);
                    let pitch = self.command_series(|c| c.pitch);
                    let yaw = self.command_series(|c| c.yaw);
                    let throttle = self.command_series(|c| c.throttle);
                    Plot::new("commands")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .legend(Legend::default())
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Aileron", roll));
                            plot_ui.line(Line::new("Elevator", pitch));
                            plot_ui.line(Line::new("Rudder", yaw));
                            plot_ui.line(Line::new("Throttle", throttle));
                        });
                });
            });
        });
    }
}
