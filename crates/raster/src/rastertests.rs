#[cfg(test)]
#[generic_tests::define]
mod tests {
    use std::collections::HashMap;

    use approx::assert_relative_eq;

    use crate::{
        Position, RasterData, RasterHeader, RasterNum, RasterOptions, ReadOptions, StatisticKind,
        testutils::{NOD, create_vec, demo_header, demo_values, mask_raster, write_ascii_grid},
    };

    fn compacted<T: RasterNum>() -> RasterData<T> {
        let mut raster = RasterData::from_array(demo_header(), demo_values(), RasterOptions::new()).expect("demo raster");
        assert!(raster.set_calc_positions());
        raster
    }

    #[test]
    fn statistics_are_computed_on_first_access<T: RasterNum>() {
        let raster = compacted::<T>();
        assert!(!raster.statistics_calculated());

        assert_relative_eq!(raster.average(), 3.5);
        assert!(raster.statistics_calculated());
        assert_relative_eq!(raster.minimum(), 1.0);
        assert_relative_eq!(raster.maximum(), 6.0);
        assert_relative_eq!(raster.range(), 5.0);
        assert_relative_eq!(raster.std(), (17.5_f64 / 6.0).sqrt(), epsilon = 1e-12);
        assert_eq!(raster.valid_number(), 6);

        // repeated access uses the cached values
        assert_relative_eq!(raster.average(), 3.5);
        assert_eq!(raster.statistics_all(StatisticKind::ValidNumber), vec![6.0]);
    }

    #[test]
    fn statistics_by_name<T: RasterNum>() {
        let raster = compacted::<T>();
        assert_relative_eq!(raster.statistics_by_name("MAX", 1).expect("known statistic"), 6.0);
        assert_relative_eq!(raster.statistics_by_name("mean", 1).expect("known statistic"), 3.5);
        assert!(raster.statistics_by_name("MEDIAN", 1).is_err());
        assert_relative_eq!(raster.statistics(StatisticKind::Mean, 2), NOD);
    }

    #[test]
    fn positions<T: RasterNum>() {
        let raster = compacted::<T>();
        assert_eq!(raster.cell_number(), 6);
        assert_eq!(raster.header().cells_num(), 6);

        assert_eq!(raster.get_position(0, 0), Position::Index(0));
        assert_eq!(raster.get_position(0, 2), Position::Filtered);
        assert_eq!(raster.get_position(3, 2), Position::Index(5));
        assert_eq!(raster.get_position(-1, 0), Position::OutOfBounds);
        assert_eq!(raster.get_position(4, 0), Position::OutOfBounds);
        assert_eq!(raster.get_position(0, 3), Position::OutOfBounds);

        // cell (0, 0) is centered at (1, 7)
        assert_eq!(raster.position_at(1.0, 7.0), Position::Index(0));
        assert_eq!(raster.position_at(5.0, 1.0), Position::Index(5));
        assert_eq!(raster.position_at(100.0, 100.0), Position::OutOfBounds);

        let cells = raster.positions().expect("position index").cells();
        assert_eq!(cells.len(), 6);
        assert_eq!((cells[2].row, cells[2].col), (1, 1));
    }

    #[test]
    fn values<T: RasterNum>() {
        let raster = compacted::<T>();
        assert_eq!(raster.value(0, 1, 1), T::from_f64(2.0));
        assert_eq!(raster.value_by_index(3, 1), T::from_f64(4.0));
        assert!(raster.is_nodata(0, 2, 1));
        assert_eq!(raster.value(0, 0, 2), raster.nodata_value());
        assert_eq!(raster.value(9, 9, 1), raster.nodata_value());
        assert_eq!(raster.value_by_index(6, 1), raster.nodata_value());
        assert_eq!(raster.values_at(1, 2), Some(vec![T::from_f64(4.0)]));
        assert_eq!(raster.values_at(0, 2), None);
        assert_eq!(raster.full_grid(1), Some(demo_values::<T>()));
    }

    #[test]
    fn set_value<T: RasterNum>() {
        let mut raster = compacted::<T>();
        assert_relative_eq!(raster.minimum(), 1.0);

        assert!(!raster.set_value(0, 2, T::from_f64(0.0), 1));
        assert!(!raster.set_value(-1, 0, T::from_f64(0.0), 1));
        assert!(!raster.set_value(0, 0, T::from_f64(0.0), 2));
        assert!(raster.set_value(0, 0, T::from_f64(0.0), 1));
        assert_eq!(raster.value(0, 0, 1), T::from_f64(0.0));

        // cached until explicitly refreshed
        assert_relative_eq!(raster.minimum(), 1.0);
        raster.update_statistics();
        assert_relative_eq!(raster.minimum(), 0.0);
    }

    #[test]
    fn set_value_on_full_grid<T: RasterNum>() {
        let mut raster = RasterData::from_array(demo_header(), demo_values::<T>(), RasterOptions::new()).expect("demo raster");
        assert!(!raster.positions_calculated());
        assert_eq!(raster.get_position(0, 2), Position::Index(2));
        assert!(raster.set_value(0, 2, T::from_f64(7.0), 1));
        assert_relative_eq!(raster.maximum(), 7.0);
        assert_eq!(raster.valid_number(), 7);
    }

    #[test]
    fn replace_nodata<T: RasterNum>() {
        let mut raster = RasterData::from_array(demo_header(), demo_values::<T>(), RasterOptions::new()).expect("demo raster");
        raster.replace_nodata(T::from_f64(0.0));
        assert_eq!(raster.value(0, 2, 1), T::from_f64(0.0));
        assert_eq!(raster.value(0, 1, 1), T::from_f64(2.0));
        assert!(!raster.is_nodata(3, 0, 1));
    }

    #[test]
    fn reclassify<T: RasterNum>() {
        let mut raster = compacted::<T>();
        let reclass: HashMap<i32, T> = [(1, T::from_f64(10.0)), (2, T::from_f64(20.0)), (6, T::from_f64(60.0))]
            .into_iter()
            .collect();
        raster.reclassify(&reclass);

        assert_eq!(raster.value(0, 0, 1), T::from_f64(10.0));
        assert_eq!(raster.value(0, 1, 1), T::from_f64(20.0));
        assert_eq!(raster.value(3, 2, 1), T::from_f64(60.0));
        assert!(raster.is_nodata(1, 1, 1));
    }

    #[test]
    fn raster_on_mask_cells<T: RasterNum>() {
        let mut mask = mask_raster::<i32>(4, 3, 1.0, 1.0, &demo_values::<f64>());
        assert!(mask.set_calc_positions());

        let raster = RasterData::from_mask_values(&mask, create_vec::<T>(&[6.0, 5.0, 4.0, 3.0, 2.0, 1.0]), RasterOptions::new())
            .expect("raster on mask");
        assert!(raster.positions_calculated());
        assert!(!raster.positions_allocated());
        assert!(raster.mask_extended());
        assert_eq!(raster.value(0, 0, 1), T::from_f64(6.0));
        assert_eq!(raster.value(3, 2, 1), T::from_f64(1.0));
        assert_eq!(raster.get_position(0, 2), Position::Filtered);

        assert!(RasterData::init_from_mask_values(&mask, create_vec::<T>(&[1.0, 2.0]), RasterOptions::new()).is_none());

        let layered = RasterData::from_mask_layers(&mask, vec![create_vec::<T>(&[1.0, 2.0]); 6], RasterOptions::new())
            .expect("layered raster on mask");
        assert!(layered.is_2d());
        assert_eq!(layered.layers(), 2);
        assert_eq!(layered.value(1, 2, 2), T::from_f64(2.0));
    }

    #[test]
    fn clone_is_independent<T: RasterNum>() {
        let raster = compacted::<T>();
        let mut copy = raster.clone();
        assert!(copy.set_value(0, 0, T::from_f64(9.0), 1));
        assert_eq!(raster.value(0, 0, 1), T::from_f64(1.0));
        assert_eq!(copy.value(0, 0, 1), T::from_f64(9.0));
        assert_eq!(copy.positions(), raster.positions());
    }

    #[test]
    fn layered_values<T: RasterNum>() {
        let values = vec![create_vec::<T>(&[1.0, 2.0, 3.0]); 12];
        let raster = RasterData::from_layers(demo_header(), values, RasterOptions::new()).expect("layered raster");
        assert!(raster.is_2d());
        assert_eq!(raster.layers(), 3);
        assert_eq!(raster.raster_data(), None);
        assert_eq!(raster.raster_2d_data().map(<[_]>::len), Some(12));
        assert_eq!(raster.statistics_all(StatisticKind::Mean), vec![1.0, 2.0, 3.0]);

        let ragged = vec![create_vec::<T>(&[1.0, 2.0]), create_vec::<T>(&[1.0])];
        assert!(RasterData::init_from_layers(demo_header(), ragged, RasterOptions::new()).is_none());
    }

    #[test]
    fn shorthands_describe_the_first_layer<T: RasterNum>() {
        let layers = demo_values::<T>()
            .into_iter()
            .map(|v| vec![v, if v == T::from_f64(NOD) { v } else { T::from_f64(v.as_f64() * 2.0) }])
            .collect();
        let raster = RasterData::from_layers(demo_header(), layers, RasterOptions::new()).expect("layered raster");

        assert_relative_eq!(raster.average(), 3.5);
        assert_relative_eq!(raster.statistics(StatisticKind::Mean, 2), 7.0);
        assert_relative_eq!(raster.maximum(), 6.0);
        assert_relative_eq!(raster.statistics(StatisticKind::Max, 2), 12.0);
        assert_relative_eq!(raster.range(), raster.statistics(StatisticKind::Range, 1));
        assert_relative_eq!(raster.statistics(StatisticKind::Range, 2), 10.0);
        assert_eq!(raster.valid_number(), 6);
    }

    #[test]
    fn default_value_follows_nodata<T: RasterNum>() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let path = tmp.path().join("nodata.asc");
        let header = RasterHeader::new(2, 2, 1.0, 1.0, 2.0, -1.0);
        write_ascii_grid(&path, &header, &create_vec::<T>(&[1.0, -1.0, 3.0, 4.0])).expect("written grid");

        let raster = RasterData::<T>::from_file(&path, &ReadOptions::default()).expect("raster");
        assert_eq!(raster.nodata_value(), T::from_f64(-1.0));
        assert_eq!(raster.default_value(), T::from_f64(-1.0));
        assert_eq!(raster.valid_number(), 3);

        let raster = RasterData::<T>::from_file(&path, &ReadOptions::default().with_default_value(5.0)).expect("raster");
        assert_eq!(raster.default_value(), T::from_f64(5.0));

        // masked cells without data take the nodata value of the raster
        let mask = mask_raster::<i32>(2, 2, 1.0, 1.0, &[1.0; 4]);
        let raster = RasterData::<T>::from_file_masked(&path, &mask, &ReadOptions::default()).expect("masked raster");
        assert_eq!(raster.cell_number(), 4);
        assert_eq!(raster.value(0, 1, 1), T::from_f64(-1.0));
        assert!(raster.is_nodata(0, 1, 1));
        assert_eq!(raster.valid_number(), 3);
    }

    #[instantiate_tests(<i16>)]
    mod rasteri16 {}

    #[instantiate_tests(<i32>)]
    mod rasteri32 {}

    #[instantiate_tests(<f32>)]
    mod rasterf32 {}

    #[instantiate_tests(<f64>)]
    mod rasterf64 {}
}

#[cfg(test)]
mod gridtests {
    use std::path::PathBuf;

    use approx::assert_relative_eq;

    use crate::{
        RasterData, ReadOptions, Result,
        testutils::{grid_20x30_header, grid_20x30_values, write_ascii_grid},
    };

    fn write_grid(dir: &tempfile::TempDir, name: &str, offset: f64) -> Result<PathBuf> {
        let path = dir.path().join(name);
        write_ascii_grid(&path, &grid_20x30_header(), &grid_20x30_values(offset))?;
        Ok(path)
    }

    #[test_log::test]
    fn compacted_read() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = write_grid(&tmp, "dem.asc", 0.0)?;

        let mut raster = RasterData::<f32>::from_file(&path, &ReadOptions::default())?;
        assert_eq!(raster.core_name(), "dem");
        assert_eq!(raster.file_path(), path.as_path());
        assert_eq!(raster.rows(), 20);
        assert_eq!(raster.cols(), 30);
        assert_eq!(raster.cell_number(), 541);
        assert_eq!(raster.value_by_index(0, 1), 2.75);
        assert_eq!(raster.value_by_index(540, 1), 98.49);
        assert_eq!(raster.valid_number(), 541);
        assert_relative_eq!(raster.minimum(), 2.75);
        assert_relative_eq!(raster.maximum(), 98.49, epsilon = 1e-5);

        // nodata cells are not stored
        assert!(!raster.set_value(0, 3, 1.0, 1));
        raster.update_statistics();
        assert_relative_eq!(raster.minimum(), 2.75);
        Ok(())
    }

    #[test_log::test]
    fn full_grid_read() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = write_grid(&tmp, "dem.asc", 0.0)?;

        let mut raster = RasterData::<f32>::from_file(&path, &ReadOptions::default().with_calc_pos(false))?;
        assert!(!raster.positions_calculated());
        assert_eq!(raster.cell_number(), 600);

        assert!(raster.set_value(0, 3, 1.0, 1));
        raster.update_statistics();
        assert_relative_eq!(raster.minimum(), 1.0);
        assert_eq!(raster.valid_number(), 542);

        // positions can still be calculated afterwards
        assert_eq!(raster.position_data().map(<[_]>::len), Some(542));
        assert!(raster.positions_allocated());
        Ok(())
    }

    #[test_log::test]
    fn layers_from_files() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let paths = vec![
            write_grid(&tmp, "tmp_1.asc", 0.0)?,
            write_grid(&tmp, "tmp_2.asc", 1.0)?,
            write_grid(&tmp, "tmp_3.asc", 2.0)?,
        ];

        let raster = RasterData::<f64>::from_files(&paths, &ReadOptions::default())?;
        assert!(raster.is_2d());
        assert_eq!(raster.layers(), 3);
        assert_eq!(raster.core_name(), "tmp");
        assert_eq!(raster.cell_number(), 541);
        assert!(raster.raster_2d_data().expect("layered data").iter().all(|cell| cell.len() == 3));

        assert_eq!(raster.value(0, 1, 1), 11.0);
        assert_eq!(raster.value(0, 1, 2), 12.0);
        assert_eq!(raster.value(0, 1, 3), 13.0);
        assert_eq!(raster.value(0, 0, 3), 2.75);
        assert!(raster.is_nodata(0, 3, 2));
        Ok(())
    }

    #[test]
    fn missing_files() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let missing = tmp.path().join("missing.asc");
        assert!(RasterData::<f32>::init_from_file(&missing, &ReadOptions::default()).is_none());

        let existing = write_grid(&tmp, "dem_1.asc", 0.0)?;
        assert!(RasterData::<f32>::init_from_files(&[existing.clone(), missing.clone()], &ReadOptions::default()).is_none());

        let mut raster = RasterData::<f32>::new();
        assert!(raster.read_from_file(&existing, &ReadOptions::default()));
        assert!(raster.initialized());
        assert!(!raster.read_from_file(&missing, &ReadOptions::default()));
        assert!(!raster.initialized());
        Ok(())
    }
}

#[cfg(test)]
mod maskedfiletests {
    use std::path::PathBuf;

    use crate::{
        RasterData, ReadOptions, Result,
        testutils::{NOD, create_vec, demo_header, demo_values, mask_raster, write_ascii_grid},
    };

    fn write_demo(dir: &tempfile::TempDir, name: &str, values: &[f64]) -> Result<PathBuf> {
        let path = dir.path().join(name);
        write_ascii_grid(&path, &demo_header(), &create_vec::<f64>(values))?;
        Ok(path)
    }

    /// Data only in the center block (rows 1-2, columns 1-2) of the demo geometry.
    fn center_block(offset: f64) -> Vec<f64> {
        vec![NOD, NOD, NOD, NOD, 3.0 + offset, 4.0 + offset, NOD, 5.0 + offset, NOD, NOD, NOD, NOD]
    }

    fn checker_mask() -> RasterData<i32> {
        // cell centers at (3, 5), (5, 5), (3, 3) and (5, 3)
        mask_raster(2, 2, 3.0, 3.0, &[NOD, 1.0, 1.0, NOD])
    }

    #[test_log::test]
    fn read_file_with_mask() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = write_demo(&tmp, "demo.asc", &demo_values::<f64>())?;

        let mask = checker_mask();
        let raster = RasterData::<f32>::from_file_masked(&path, &mask, &ReadOptions::default())?;
        assert_eq!(raster.core_name(), "demo");
        assert_eq!((raster.rows(), raster.cols()), (2, 2));
        assert_eq!(raster.xll_center(), 3.0);
        assert!(raster.positions_allocated());
        assert_eq!(raster.cell_number(), 2);
        assert_eq!(raster.value(0, 1, 1), 4.0);
        assert_eq!(raster.value(1, 0, 1), 5.0);
        assert!(raster.is_nodata(0, 0, 1));

        let mut mask = checker_mask();
        assert!(mask.set_calc_positions());
        let raster = RasterData::<f32>::init_from_file_masked(&path, &mask, &ReadOptions::default()).expect("masked raster");
        assert!(raster.positions_calculated());
        assert!(!raster.positions_allocated());
        assert_eq!(raster.value_by_index(0, 1), 4.0);
        assert_eq!(raster.value_by_index(1, 1), 5.0);

        let mut read = RasterData::<f64>::new();
        assert!(read.read_from_file_masked(&path, &mask, &ReadOptions::default()));
        assert_eq!(read.value(1, 0, 1), 5.0);
        assert!(!read.read_from_file_masked(&tmp.path().join("missing.asc"), &mask, &ReadOptions::default()));
        assert!(!read.initialized());
        assert!(RasterData::<f64>::init_from_file_masked(&tmp.path().join("missing.asc"), &mask, &ReadOptions::default()).is_none());
        Ok(())
    }

    #[test_log::test]
    fn layer_files_on_mask_extent() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let paths = vec![
            write_demo(&tmp, "block_1.asc", &center_block(0.0))?,
            write_demo(&tmp, "block_2.asc", &center_block(10.0))?,
        ];

        let mask = mask_raster::<i32>(4, 3, 1.0, 1.0, &[1.0; 12]);
        let opts = ReadOptions::default().with_default_value(0.0);
        let raster = RasterData::<f64>::from_files_masked(&paths, &mask, &opts)?;

        assert_eq!(raster.core_name(), "block");
        assert_eq!(raster.layers(), 2);
        assert_eq!((raster.rows(), raster.cols()), (4, 3));
        assert_eq!(raster.cell_number(), 12);
        // the default value only fills the first layer, later layers keep their nodata
        assert_eq!(raster.values_at(0, 0), Some(vec![0.0, NOD]));
        assert_eq!(raster.values_at(1, 1), Some(vec![3.0, 13.0]));
        assert_eq!(raster.values_at(2, 1), Some(vec![5.0, 15.0]));
        Ok(())
    }

    #[test_log::test]
    fn layer_files_cropped_to_data() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let paths = vec![
            write_demo(&tmp, "block_1.asc", &center_block(0.0))?,
            write_demo(&tmp, "block_2.asc", &center_block(10.0))?,
        ];

        let mask = mask_raster::<i32>(4, 3, 1.0, 1.0, &[1.0; 12]);
        let opts = ReadOptions::default().with_default_value(0.0).with_mask_extent(false);
        let raster = RasterData::<f64>::init_from_files_masked(&paths, &mask, &opts).expect("layered raster");

        assert_eq!((raster.rows(), raster.cols()), (2, 2));
        assert_eq!((raster.xll_center(), raster.yll_center()), (3.0, 3.0));
        assert_eq!(raster.cell_number(), 4);
        assert_eq!(raster.values_at(0, 0), Some(vec![3.0, 13.0]));
        assert_eq!(raster.values_at(0, 1), Some(vec![4.0, 14.0]));
        assert_eq!(raster.values_at(1, 0), Some(vec![5.0, 15.0]));
        assert_eq!(raster.values_at(1, 1), Some(vec![0.0, NOD]));
        Ok(())
    }

    #[test]
    fn caller_options_are_merged() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = write_demo(&tmp, "demo.asc", &demo_values::<f64>())?;

        let opts = ReadOptions::default()
            .with_option("SCENARIO", "baseline")
            .with_option("SRS", "EPSG:31370");
        let raster = RasterData::<f32>::from_file(&path, &opts)?;
        assert_eq!(raster.option("SCENARIO"), "baseline");
        assert_eq!(raster.srs(), "EPSG:31370");

        let raster = RasterData::<f32>::from_file(&path, &ReadOptions::default())?;
        assert!(raster.options().contains("SRS"));
        assert_eq!(raster.srs(), "");
        assert!(!raster.options().contains("SCENARIO"));
        Ok(())
    }
}
