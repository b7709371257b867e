#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("road_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use roadmesh_engine::geom::{GeomMesh, GeomMeshDiagnostics, Point3, Vec3};
    use roadmesh_engine::road::{
        ControlPoint, MorphOutcome, PathTracer, RoadConfig, RoadMeshGen, RoadMeshes, TerrainGrid,
        UvMode, no_progress,
    };
    use std::fmt::Write as _;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;

    const USAGE: &str = r#"road_cli (roadmesh-engine)

USAGE:
  road_cli list
  road_cli run <scenario|all> [options]

SCENARIOS:
  straight_ribbon
  single_point
  right_angle_query
  winding_with_borders
  terrain_morph

OPTIONS (run):
  --out-dir <dir>    Write <scenario>.obj and/or <scenario>.snap to this dir (required for `all`)
  --obj <path>       Write OBJ of the ribbon (single scenario only)
  --snap <path>      Write snapshot (single scenario only)
  --no-obj           Skip OBJ when using --out-dir
  --no-snap          Skip snapshot when using --out-dir
  --overwrite        Overwrite existing output files
  -h, --help         Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut out_dir: Option<PathBuf> = None;
        let mut obj_path: Option<PathBuf> = None;
        let mut snap_path: Option<PathBuf> = None;
        let mut overwrite = false;
        let mut write_obj = true;
        let mut write_snap = true;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--overwrite" => overwrite = true,
                "--no-obj" => write_obj = false,
                "--no-snap" => write_snap = false,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if let Some(dir) = out_dir.as_ref() {
            if obj_path.is_some() || snap_path.is_some() {
                return Err("use either --out-dir or --obj/--snap (not both)".to_string());
            }
            if !write_obj && !write_snap {
                return Err("nothing to write (both --no-obj and --no-snap set)".to_string());
            }

            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            if scenario_name == "all" {
                for scenario in Scenario::ALL {
                    run_one_scenario_to_dir(*scenario, dir, write_obj, write_snap, overwrite)?;
                }
                return Ok(());
            }

            let scenario = Scenario::from_str(scenario_name.as_str())
                .ok_or_else(|| unknown_scenario(&scenario_name))?;
            return run_one_scenario_to_dir(scenario, dir, write_obj, write_snap, overwrite);
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario =
            Scenario::from_str(scenario_name.as_str()).ok_or_else(|| unknown_scenario(&scenario_name))?;
        let output = run_scenario(scenario)?;

        if let Some(path) = snap_path.as_deref() {
            write_text_file(path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        } else {
            print!("{}", output.snapshot);
        }

        if let Some(path) = obj_path.as_deref() {
            write_obj_file(path, &output.meshes, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        report(&output);
        Ok(())
    }

    fn run_one_scenario_to_dir(
        scenario: Scenario,
        dir: &Path,
        write_obj: bool,
        write_snap: bool,
        overwrite: bool,
    ) -> Result<(), String> {
        let output = run_scenario(scenario)?;

        if write_snap {
            let path = dir.join(format!("{}.snap", output.name));
            write_text_file(&path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        if write_obj {
            let path = dir.join(format!("{}.obj", output.name));
            write_obj_file(&path, &output.meshes, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        report(&output);
        Ok(())
    }

    fn report(output: &ScenarioOutput) {
        eprintln!(
            "{}: vertices={} triangles={} | {}",
            output.name,
            output.meshes.ribbon.vertex_count(),
            output.meshes.ribbon.triangle_count(),
            output.meshes.diagnostics.summary()
        );
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = String::new();
        let _ = writeln!(msg, "unknown scenario `{name}`\n\navailable scenarios:");
        for scenario in Scenario::ALL {
            let _ = writeln!(msg, "  {}", scenario.name());
        }
        msg
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, normalize_snapshot_text(text)).map_err(|e| format!("write {}: {e}", path.display()))
    }

    /// Writes the ribbon and any border sheets as separate OBJ objects.
    fn write_obj_file(path: &Path, meshes: &RoadMeshes, name: &str, overwrite: bool) -> Result<(), String> {
        let mut parts: Vec<(String, &GeomMesh)> = vec![(format!("{name}_ribbon"), &meshes.ribbon)];
        if let Some(borders) = meshes.borders.as_ref() {
            parts.push((format!("{name}_border_left"), &borders.left));
            parts.push((format!("{name}_border_right"), &borders.right));
        }
        for (part, mesh) in &parts {
            mesh.validate().map_err(|e| format!("{part}: mesh validation failed: {e}"))?;
        }

        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);
        writeln!(w, "# roadmesh-engine road_cli").map_err(|e| format!("write obj: {e}"))?;

        // OBJ indices are global and 1-based.
        let mut base = 1u32;
        for (part, mesh) in &parts {
            write_obj_object(&mut w, part, mesh, base).map_err(|e| format!("write obj: {e}"))?;
            base += u32::try_from(mesh.vertex_count()).map_err(|e| format!("write obj: {e}"))?;
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    fn write_obj_object(w: &mut impl Write, name: &str, mesh: &GeomMesh, base: u32) -> std::io::Result<()> {
        writeln!(w, "o {name}")?;

        for p in mesh.positions.iter().copied() {
            writeln!(w, "v {} {} {}", p[0], p[1], p[2])?;
        }
        if let Some(uvs) = mesh.uvs.as_ref() {
            for uv in uvs.iter().copied() {
                writeln!(w, "vt {} {}", uv[0], uv[1])?;
            }
        }
        if let Some(normals) = mesh.normals.as_ref() {
            for n in normals.iter().copied() {
                writeln!(w, "vn {} {} {}", n[0], n[1], n[2])?;
            }
        }

        let has_uvs = mesh.uvs.is_some();
        let has_normals = mesh.normals.is_some();

        for tri in mesh.indices.chunks_exact(3) {
            let a = tri[0] + base;
            let b = tri[1] + base;
            let c = tri[2] + base;

            match (has_uvs, has_normals) {
                (true, true) => writeln!(w, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}"),
                (true, false) => writeln!(w, "f {a}/{a} {b}/{b} {c}/{c}"),
                (false, true) => writeln!(w, "f {a}//{a} {b}//{b} {c}//{c}"),
                (false, false) => writeln!(w, "f {a} {b} {c}"),
            }?;
        }
        Ok(())
    }

    fn normalize_snapshot_text(text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        if normalized.ends_with('\n') {
            normalized
        } else {
            format!("{normalized}\n")
        }
    }

    fn quantize_f64(value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        if q == 0.0 { 0.0 } else { q }
    }

    fn write_f64(out: &mut String, value: f64) {
        let value = quantize_f64(value);
        let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
    }

    fn write_vec3_line(out: &mut String, prefix: &str, v: [f64; 3]) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, v[0]);
        out.push(' ');
        write_f64(out, v[1]);
        out.push(' ');
        write_f64(out, v[2]);
        out.push('\n');
    }

    fn write_vec2_line(out: &mut String, prefix: &str, v: [f64; 2]) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, v[0]);
        out.push(' ');
        write_f64(out, v[1]);
        out.push('\n');
    }

    fn write_diagnostics(out: &mut String, diag: &GeomMeshDiagnostics) {
        let _ = writeln!(out, "road_diag.vertex_count {}", diag.vertex_count);
        let _ = writeln!(out, "road_diag.triangle_count {}", diag.triangle_count);
        let _ = writeln!(out, "road_diag.sample_count {}", diag.sample_count);
        let _ = writeln!(
            out,
            "road_diag.degenerate_triangle_count {}",
            diag.degenerate_triangle_count
        );
        let _ = writeln!(out, "road_diag.open_edge_count {}", diag.open_edge_count);
        let _ = writeln!(
            out,
            "road_diag.non_manifold_edge_count {}",
            diag.non_manifold_edge_count
        );
        let _ = writeln!(out, "road_diag.warning_count {}", diag.warnings.len());
        for (idx, warning) in diag.warnings.iter().enumerate() {
            let _ = writeln!(out, "road_diag.warning.{idx} {warning}");
        }
    }

    fn write_mesh(out: &mut String, label: &str, mesh: &GeomMesh) -> Result<(), String> {
        mesh.validate().map_err(|e| format!("{label}: {e}"))?;

        let _ = writeln!(out, "{label}.vertex_count {}", mesh.positions.len());
        let _ = writeln!(out, "{label}.triangle_count {}", mesh.indices.len() / 3);

        for p in mesh.positions.iter().copied() {
            write_vec3_line(out, "p", p);
        }
        for tri in mesh.indices.chunks_exact(3) {
            let _ = writeln!(out, "i {} {} {}", tri[0], tri[1], tri[2]);
        }
        if let Some(uvs) = mesh.uvs.as_ref() {
            for uv in uvs.iter().copied() {
                write_vec2_line(out, "uv", uv);
            }
        }
        if let Some(normals) = mesh.normals.as_ref() {
            for n in normals.iter().copied() {
                write_vec3_line(out, "n", n);
            }
        }
        Ok(())
    }

    fn write_meshes(out: &mut String, meshes: &RoadMeshes) -> Result<(), String> {
        write_diagnostics(out, &meshes.diagnostics);
        write_mesh(out, "ribbon", &meshes.ribbon)?;
        if let Some(borders) = meshes.borders.as_ref() {
            write_mesh(out, "border_left", &borders.left)?;
            write_mesh(out, "border_right", &borders.right)?;
        }
        Ok(())
    }

    fn snapshot(op: &str, sections: impl FnOnce(&mut String) -> Result<(), String>) -> Result<String, String> {
        let mut out = String::new();
        let _ = writeln!(out, "# roadmesh-engine snapshot v1");
        let _ = writeln!(out, "op {op}");
        let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
        sections(&mut out)?;
        Ok(normalize_snapshot_text(&out))
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        StraightRibbon,
        SinglePoint,
        RightAngleQuery,
        WindingWithBorders,
        TerrainMorph,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::StraightRibbon,
            Scenario::SinglePoint,
            Scenario::RightAngleQuery,
            Scenario::WindingWithBorders,
            Scenario::TerrainMorph,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::StraightRibbon => "straight_ribbon",
                Scenario::SinglePoint => "single_point",
                Scenario::RightAngleQuery => "right_angle_query",
                Scenario::WindingWithBorders => "winding_with_borders",
                Scenario::TerrainMorph => "terrain_morph",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            Scenario::ALL.iter().copied().find(|s| s.name() == name)
        }
    }

    struct ScenarioOutput {
        name: &'static str,
        meshes: RoadMeshes,
        snapshot: String,
    }

    fn run_scenario(scenario: Scenario) -> Result<ScenarioOutput, String> {
        match scenario {
            Scenario::StraightRibbon => scenario_straight_ribbon(),
            Scenario::SinglePoint => scenario_single_point(),
            Scenario::RightAngleQuery => scenario_right_angle_query(),
            Scenario::WindingWithBorders => scenario_winding_with_borders(),
            Scenario::TerrainMorph => scenario_terrain_morph(),
        }
    }

    fn generator(config: RoadConfig, positions: &[[f64; 3]]) -> Result<RoadMeshGen, String> {
        let points = positions
            .iter()
            .map(|&p| ControlPoint::new(Point3::from_array(p)))
            .collect();
        RoadMeshGen::with_points(config, points).map_err(|e| e.to_string())
    }

    fn scenario_straight_ribbon() -> Result<ScenarioOutput, String> {
        let config = RoadConfig {
            width: 2.0,
            ..RoadConfig::default()
        };
        let generator = generator(config, &[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]])?;
        let meshes = generator.meshes().clone();

        let snap = snapshot("straight_ribbon", |out| write_meshes(out, &meshes))?;
        Ok(ScenarioOutput {
            name: "straight_ribbon",
            meshes,
            snapshot: snap,
        })
    }

    fn scenario_single_point() -> Result<ScenarioOutput, String> {
        let generator = generator(RoadConfig::default(), &[[1.0, 0.0, 2.0]])?;
        let meshes = generator.meshes().clone();
        let projected = generator.closest_point_on_path(Point3::new(5.0, 3.0, -4.0));

        let snap = snapshot("single_point", |out| {
            write_vec3_line(out, "closest", projected.to_array());
            write_meshes(out, &meshes)
        })?;
        Ok(ScenarioOutput {
            name: "single_point",
            meshes,
            snapshot: snap,
        })
    }

    fn scenario_right_angle_query() -> Result<ScenarioOutput, String> {
        let generator = generator(
            RoadConfig::default(),
            &[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 0.0, 10.0]],
        )?;
        let meshes = generator.meshes().clone();
        let queries = [
            Point3::new(8.0, 0.0, 2.0),
            Point3::new(12.0, 0.0, 2.0),
            Point3::new(-3.0, 1.0, 1.0),
        ];

        let snap = snapshot("right_angle_query", |out| {
            for (idx, query) in queries.iter().enumerate() {
                let projected = generator.closest_point_on_path(*query);
                write_vec3_line(out, &format!("query.{idx}"), query.to_array());
                write_vec3_line(out, &format!("closest.{idx}"), projected.to_array());
            }
            write_meshes(out, &meshes)
        })?;
        Ok(ScenarioOutput {
            name: "right_angle_query",
            meshes,
            snapshot: snap,
        })
    }

    fn scenario_winding_with_borders() -> Result<ScenarioOutput, String> {
        let config = RoadConfig {
            subdivision: 6,
            width: 3.0,
            borders_enabled: true,
            uv_mode: UvMode::MatchWidth,
            ..RoadConfig::default()
        };
        let generator = generator(
            config,
            &[
                [0.0, 0.0, 0.0],
                [12.0, 1.0, 4.0],
                [20.0, 2.0, -6.0],
                [32.0, 1.0, 0.0],
            ],
        )?;
        let meshes = generator.meshes().clone();

        let mut tracer = PathTracer::new();
        tracer
            .trace_path(0, &generator, 0.0, 0.0)
            .map_err(|e| e.to_string())?;
        let length = tracer.total_length(0).map_err(|e| e.to_string())?;
        let midpoint = tracer.evaluate(0, length / 2.0, 1.0).map_err(|e| e.to_string())?;

        let snap = snapshot("winding_with_borders", |out| {
            let _ = write!(out, "path.length ");
            write_f64(out, length);
            out.push('\n');
            write_vec3_line(out, "path.midpoint", midpoint.position.to_array());
            write_vec3_line(out, "path.midpoint_tangent", midpoint.tangent.to_array());
            write_meshes(out, &meshes)
        })?;
        Ok(ScenarioOutput {
            name: "winding_with_borders",
            meshes,
            snapshot: snap,
        })
    }

    fn scenario_terrain_morph() -> Result<ScenarioOutput, String> {
        let config = RoadConfig {
            width: 4.0,
            terrain_smoothing: 1.0,
            ground_offset: 0.1,
            ..RoadConfig::default()
        };
        let mut generator = generator(config, &[[0.0, 7.0, 25.0], [50.0, 7.0, 25.0]])?;
        let mut terrain = TerrainGrid::flat(Point3::ORIGIN, Vec3::new(50.0, 10.0, 50.0), 100, 0.5);

        let outcome = generator
            .morph_terrain(&mut terrain, &mut no_progress)
            .map_err(|e| e.to_string())?;
        let MorphOutcome::Applied(stats) = outcome else {
            return Err(format!("terrain morph did nothing: {outcome:?}"));
        };
        let meshes = generator.meshes().clone();

        let snap = snapshot("terrain_morph", |out| {
            let _ = writeln!(out, "morph.strokes {}", stats.strokes);
            let _ = writeln!(out, "morph.texels_covered {}", stats.texels_covered);
            let _ = writeln!(out, "morph.texels_written {}", stats.texels_written);
            // One column across the road.
            for y in 40..=60 {
                let height = terrain.height_at(50, y).unwrap_or(f64::NAN);
                let _ = write!(out, "column.{y} ");
                write_f64(out, height);
                out.push('\n');
            }
            write_meshes(out, &meshes)
        })?;
        Ok(ScenarioOutput {
            name: "terrain_morph",
            meshes,
            snapshot: snap,
        })
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
