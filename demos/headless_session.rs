use curve_scene::prelude::*;
use nalgebra::{Matrix4, Point3, Vector3};

/// Logs every drawn shape instead of talking to a graphics API
#[derive(Default)]
struct LogRenderer {
    calls: usize,
}

impl Renderer<f32> for LogRenderer {
    fn draw(&mut self, model: &Matrix4<f32>, shape: &Shape<f32>) {
        self.calls += 1;
        let origin = model.transform_point(&Point3::origin());
        match shape {
            Shape::Sphere { radius, .. } => {
                log::debug!("sphere r={} at {:?}", radius, origin.coords.as_slice())
            }
            Shape::Polyline {
                points, primitive, ..
            } => log::debug!("{:?} with {} points", primitive, points.len()),
        }
    }
}

fn main() {
    env_logger::init();

    let mut store = EntityStore::<f32>::new();
    let mut session = CurveEditSession::new(CurveEditOption::default().with_degree(3));

    let eye = Point3::new(2., 1., -6.);
    let points = [
        Point3::new(-3., 0., 0.),
        Point3::new(-2., 2., 0.),
        Point3::new(0., -1., 1.),
        Point3::new(1., 2., 0.),
        Point3::new(3., -2., -1.),
        Point3::new(4., 0., 0.),
    ];
    let ids: Vec<_> = points
        .iter()
        .map(|p| session.create_control_point(&mut store, *p))
        .collect();
    log::info!(
        "{} control points, {} bezier pieces",
        ids.len(),
        session.update_curves(&mut store)
    );

    // drag the third control point towards the eye
    let target = points[2];
    let ray = Ray::new(eye, (target - eye).normalize());
    if let GrabOutcome::Grabbed(id) = session.toggle_grab(&mut store, &ray) {
        session.scroll(&mut store, &eye, -1.);
        session.scroll(&mut store, &eye, -1.);
        log::info!("moved {} to {:?}", id, store.get(id).map(|e| *e.position()));
        session.toggle_grab(&mut store, &ray);
    }

    session.set_weights(&mut store, &[1., 1., 4.]);

    // try to delete the NURBS curve entity itself, then a real control point
    let ray = Ray::new(Point3::new(0., 0., -5.), Vector3::z());
    log::info!("delete at origin: {:?}", session.delete_control_point(&mut store, &ray));
    let last = points[5];
    let ray = Ray::new(last - Vector3::z() * 5., Vector3::z());
    log::info!("delete last: {:?}", session.delete_control_point(&mut store, &ray));

    let mut renderer = LogRenderer::default();
    for _ in 0..3 {
        let pieces = session.tick(&mut store, 1. / 60.);
        store.draw_all(&mut renderer);
        log::debug!("tick: {} pieces", pieces);
    }
    log::info!("{} draw calls", renderer.calls);

    store.log_debug_info();
}
